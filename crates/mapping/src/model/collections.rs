//! Ordered, keyed collections of mapping entities

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

use super::class_definition::ClassDefinition;
use super::end_points::{AnyRelationEndPointDefinition, RelationEndPoint};
use super::property_definition::PropertyDefinition;
use super::relation_definition::RelationDefinition;
use crate::error::{MappingError, MappingResult};

/// Property definitions keyed by qualified property name, in declaration order
#[derive(Debug, Default)]
pub struct PropertyDefinitionCollection {
    items: IndexMap<String, Arc<PropertyDefinition>>,
}

impl PropertyDefinitionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, property_definition: Arc<PropertyDefinition>) -> MappingResult<()> {
        let name = property_definition.property_name().to_string();
        if self.items.contains_key(&name) {
            return Err(MappingError::configuration(format!(
                "Property '{}' has already been added to the property definitions of class '{}'.",
                name,
                property_definition.class_id()
            )));
        }
        self.items.insert(name, property_definition);
        Ok(())
    }

    pub fn get(&self, property_name: &str) -> Option<&Arc<PropertyDefinition>> {
        self.items.get(property_name)
    }

    pub fn contains(&self, property_name: &str) -> bool {
        self.items.contains_key(property_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PropertyDefinition>> {
        self.items.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// End point definitions keyed by qualified property name
#[derive(Debug, Default)]
pub struct RelationEndPointDefinitionCollection {
    items: IndexMap<String, Arc<AnyRelationEndPointDefinition>>,
}

impl RelationEndPointDefinitionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, end_point: Arc<AnyRelationEndPointDefinition>) -> MappingResult<()> {
        let Some(name) = end_point.property_name().map(str::to_string) else {
            return Err(MappingError::configuration(format!(
                "Anonymous end points cannot be added to the end point definitions of class '{}'.",
                end_point.class_id()
            )));
        };
        if self.items.contains_key(&name) {
            return Err(MappingError::configuration(format!(
                "End point '{}' has already been added to the end point definitions of class '{}'.",
                name,
                end_point.class_id()
            )));
        }
        self.items.insert(name, end_point);
        Ok(())
    }

    pub fn get(&self, property_name: &str) -> Option<&Arc<AnyRelationEndPointDefinition>> {
        self.items.get(property_name)
    }

    pub fn contains(&self, property_name: &str) -> bool {
        self.items.contains_key(property_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AnyRelationEndPointDefinition>> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Class definitions keyed by class ID, base classes before derived ones
#[derive(Debug, Default)]
pub struct ClassDefinitionCollection {
    items: IndexMap<String, Arc<ClassDefinition>>,
    /// type full name -> class ID
    types: HashMap<String, String>,
}

impl ClassDefinitionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, class_definition: Arc<ClassDefinition>) -> MappingResult<()> {
        let id = class_definition.id().to_string();
        let type_name = class_definition.class_type_name().to_string();

        if let Some(existing) = self.items.get(&id) {
            return Err(MappingError::configuration(format!(
                "Class '{}' and '{}' both have the same class ID '{}'. Use an explicit class ID to define unique IDs for these classes.",
                existing.class_type_name(),
                type_name,
                id
            )));
        }
        if self.types.contains_key(&type_name) {
            return Err(MappingError::configuration(format!(
                "Type '{}' is already part of the mapping.",
                type_name
            )));
        }

        self.types.insert(type_name, id.clone());
        self.items.insert(id, class_definition);
        Ok(())
    }

    pub fn get(&self, class_id: &str) -> Option<&Arc<ClassDefinition>> {
        self.items.get(class_id)
    }

    pub fn get_mandatory(&self, class_id: &str) -> MappingResult<&Arc<ClassDefinition>> {
        self.get(class_id).ok_or_else(|| {
            MappingError::not_found(format!("Mapping does not contain class '{}'.", class_id))
        })
    }

    pub fn get_by_type(&self, type_name: &str) -> Option<&Arc<ClassDefinition>> {
        self.types.get(type_name).and_then(|id| self.items.get(id))
    }

    pub fn get_mandatory_by_type(&self, type_name: &str) -> MappingResult<&Arc<ClassDefinition>> {
        self.get_by_type(type_name).ok_or_else(|| {
            MappingError::not_found(format!("Mapping does not contain type '{}'.", type_name))
        })
    }

    pub fn contains(&self, class_id: &str) -> bool {
        self.items.contains_key(class_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ClassDefinition>> {
        self.items.values()
    }

    /// Classes without a base class
    pub fn inheritance_root_classes(&self) -> Vec<Arc<ClassDefinition>> {
        self.items
            .values()
            .filter(|class_definition| class_definition.base_class().is_none())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Relation definitions keyed by relation ID
#[derive(Debug, Default)]
pub struct RelationDefinitionCollection {
    items: IndexMap<String, Arc<RelationDefinition>>,
}

impl RelationDefinitionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, relation_definition: Arc<RelationDefinition>) -> MappingResult<()> {
        let id = relation_definition.id().to_string();
        if self.items.contains_key(&id) {
            return Err(MappingError::configuration(format!(
                "Relation '{}' is already part of the mapping.",
                id
            )));
        }
        self.items.insert(id, relation_definition);
        Ok(())
    }

    pub fn get(&self, relation_id: &str) -> Option<&Arc<RelationDefinition>> {
        self.items.get(relation_id)
    }

    pub fn get_mandatory(&self, relation_id: &str) -> MappingResult<&Arc<RelationDefinition>> {
        self.get(relation_id).ok_or_else(|| {
            MappingError::not_found(format!(
                "Mapping does not contain relation '{}'.",
                relation_id
            ))
        })
    }

    pub fn contains(&self, relation_id: &str) -> bool {
        self.items.contains_key(relation_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RelationDefinition>> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
