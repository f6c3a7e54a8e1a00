//! Class definitions
//!
//! A class definition is created with its identity and base class, and then
//! receives its derived classes, property definitions, end point definitions
//! and storage entity exactly once each. After that it is read-only.

use std::sync::{Arc, Weak};

use super::collections::{PropertyDefinitionCollection, RelationEndPointDefinitionCollection};
use super::end_points::AnyRelationEndPointDefinition;
use super::property_definition::PropertyDefinition;
use super::storage::StorageEntityDefinition;
use crate::error::{MappingError, MappingResult};
use crate::mixins::{ClassDefinitionValidator, MixinConfiguration, PersistentMixinFinder};
use crate::reflection::{ClassDeclaration, TypeInfo};
use crate::write_once::WriteOnce;

/// The type a class definition represents
#[derive(Debug, Clone)]
pub enum ClassType {
    Resolved(Arc<ClassDeclaration>),
    /// Referenced by the mapping but not part of it
    TypeNotFound(TypeInfo),
}

impl ClassType {
    pub fn type_info(&self) -> &TypeInfo {
        match self {
            ClassType::Resolved(declaration) => &declaration.type_info,
            ClassType::TypeNotFound(type_info) => type_info,
        }
    }
}

#[derive(Debug)]
pub struct ClassDefinition {
    id: String,
    class_type: ClassType,
    is_abstract: bool,
    base_class: Option<Arc<ClassDefinition>>,
    derived_classes: WriteOnce<Vec<Weak<ClassDefinition>>>,
    property_definitions: WriteOnce<PropertyDefinitionCollection>,
    relation_end_point_definitions: WriteOnce<RelationEndPointDefinitionCollection>,
    persistent_mixin_finder: PersistentMixinFinder,
    storage_group_type: Option<String>,
    storage_entity_definition: WriteOnce<StorageEntityDefinition>,
}

impl ClassDefinition {
    pub fn new(
        id: impl Into<String>,
        declaration: Arc<ClassDeclaration>,
        base_class: Option<Arc<ClassDefinition>>,
        persistent_mixin_finder: PersistentMixinFinder,
    ) -> Self {
        Self {
            id: id.into(),
            is_abstract: declaration.is_abstract,
            storage_group_type: declaration.storage_group.clone(),
            class_type: ClassType::Resolved(declaration),
            base_class,
            derived_classes: WriteOnce::new(),
            property_definitions: WriteOnce::new(),
            relation_end_point_definitions: WriteOnce::new(),
            persistent_mixin_finder,
            storage_entity_definition: WriteOnce::new(),
        }
    }

    /// Stand-in for a type referenced by the mapping that is not part of it.
    ///
    /// Its collections are sealed empty right away.
    pub fn type_not_found(id: impl Into<String>, type_info: TypeInfo) -> Self {
        Self {
            id: id.into(),
            class_type: ClassType::TypeNotFound(type_info),
            is_abstract: false,
            base_class: None,
            derived_classes: WriteOnce::with_value(Vec::new()),
            property_definitions: WriteOnce::with_value(PropertyDefinitionCollection::new()),
            relation_end_point_definitions: WriteOnce::with_value(RelationEndPointDefinitionCollection::new()),
            persistent_mixin_finder: PersistentMixinFinder::empty(),
            storage_group_type: None,
            storage_entity_definition: WriteOnce::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class_type(&self) -> &ClassType {
        &self.class_type
    }

    pub fn class_type_name(&self) -> &str {
        &self.class_type.type_info().full_name
    }

    pub fn declaration(&self) -> Option<&Arc<ClassDeclaration>> {
        match &self.class_type {
            ClassType::Resolved(declaration) => Some(declaration),
            ClassType::TypeNotFound(_) => None,
        }
    }

    pub fn is_type_not_found(&self) -> bool {
        matches!(self.class_type, ClassType::TypeNotFound(_))
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn base_class(&self) -> Option<&Arc<ClassDefinition>> {
        self.base_class.as_ref()
    }

    /// Base class chain, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = &ClassDefinition> {
        std::iter::successors(self.base_class.as_deref(), |class| class.base_class.as_deref())
    }

    pub fn inheritance_root(&self) -> &ClassDefinition {
        self.ancestors().last().unwrap_or(self)
    }

    /// True when `other` is this class or derives from it
    pub fn is_same_or_base_class_of(&self, other: &ClassDefinition) -> bool {
        other.id == self.id || other.ancestors().any(|ancestor| ancestor.id == self.id)
    }

    pub fn derived_classes(&self) -> Vec<Arc<ClassDefinition>> {
        self.derived_classes
            .get()
            .map(|derived| derived.iter().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }

    pub fn has_derived_classes_set(&self) -> bool {
        self.derived_classes.is_set()
    }

    /// Seal the derived classes; each must name this class as its base class
    pub fn set_derived_classes(&self, derived_classes: &[Arc<ClassDefinition>]) -> MappingResult<()> {
        for derived in derived_classes {
            match derived.base_class() {
                Some(base) if base.id == self.id => {}
                Some(base) => {
                    return Err(MappingError::configuration(format!(
                        "Derived class '{}' cannot be added to class '{}', because it has class '{}' as its base class definition defined.",
                        derived.id, self.id, base.id
                    )));
                }
                None => {
                    return Err(MappingError::configuration(format!(
                        "Derived class '{}' cannot be added to class '{}', because it has no base class definition defined.",
                        derived.id, self.id
                    )));
                }
            }
        }

        let weak = derived_classes.iter().map(Arc::downgrade).collect();
        self.derived_classes.set(weak, || {
            format!("Derived classes have already been set for class '{}'.", self.id)
        })
    }

    pub fn set_property_definitions(&self, property_definitions: PropertyDefinitionCollection) -> MappingResult<()> {
        for property in property_definitions.iter() {
            if property.class_id() != self.id {
                return Err(MappingError::configuration(format!(
                    "Property '{}' cannot be added to class '{}', because it was defined for class '{}'.",
                    property.property_name(),
                    self.id,
                    property.class_id()
                )));
            }
            if let Some(ancestor) = self
                .ancestors()
                .find(|ancestor| ancestor.my_property(property.property_name()).is_some())
            {
                return Err(MappingError::configuration(format!(
                    "Property '{}' of class '{}' is already defined in base class '{}'.",
                    property.property_name(),
                    self.id,
                    ancestor.id
                )));
            }
        }

        let count = property_definitions.len();
        self.property_definitions.set(property_definitions, || {
            format!("Property definitions have already been set for class '{}'.", self.id)
        })?;
        tracing::debug!("Set {} property definitions on class '{}'", count, self.id);
        Ok(())
    }

    pub fn set_relation_end_point_definitions(
        &self,
        end_points: RelationEndPointDefinitionCollection,
    ) -> MappingResult<()> {
        use super::end_points::RelationEndPoint;

        for end_point in end_points.iter() {
            if end_point.class_id() != self.id {
                return Err(MappingError::configuration(format!(
                    "Relation end point for property '{}' cannot be added to class '{}', because it was defined for class '{}'.",
                    end_point.property_name().unwrap_or_default(),
                    self.id,
                    end_point.class_id()
                )));
            }
        }

        let count = end_points.len();
        self.relation_end_point_definitions.set(end_points, || {
            format!(
                "Relation end point definitions have already been set for class '{}'.",
                self.id
            )
        })?;
        tracing::debug!("Set {} relation end point definitions on class '{}'", count, self.id);
        Ok(())
    }

    pub fn my_property_definitions(&self) -> MappingResult<&PropertyDefinitionCollection> {
        self.property_definitions.get_or_not_found(|| {
            format!("No property definitions have been set for class '{}'.", self.id)
        })
    }

    pub fn my_relation_end_point_definitions(&self) -> MappingResult<&RelationEndPointDefinitionCollection> {
        self.relation_end_point_definitions.get_or_not_found(|| {
            format!(
                "No relation end point definitions have been set for class '{}'.",
                self.id
            )
        })
    }

    fn my_property(&self, property_name: &str) -> Option<&Arc<PropertyDefinition>> {
        self.property_definitions
            .get()
            .and_then(|properties| properties.get(property_name))
    }

    fn my_end_point(&self, property_name: &str) -> Option<&Arc<AnyRelationEndPointDefinition>> {
        self.relation_end_point_definitions
            .get()
            .and_then(|end_points| end_points.get(property_name))
    }

    /// Own and inherited property definitions, root class first
    pub fn get_property_definitions(&self) -> Vec<Arc<PropertyDefinition>> {
        let mut chain: Vec<&ClassDefinition> = self.ancestors().collect();
        chain.reverse();
        chain.push(self);

        chain
            .into_iter()
            .filter_map(|class| class.property_definitions.get())
            .flat_map(|properties| properties.iter().cloned())
            .collect()
    }

    /// Own or inherited property definition
    pub fn get_property_definition(&self, property_name: &str) -> Option<Arc<PropertyDefinition>> {
        std::iter::once(self)
            .chain(self.ancestors())
            .find_map(|class| class.my_property(property_name))
            .cloned()
    }

    pub fn get_mandatory_property_definition(&self, property_name: &str) -> MappingResult<Arc<PropertyDefinition>> {
        self.get_property_definition(property_name).ok_or_else(|| {
            MappingError::not_found(format!(
                "Class '{}' does not contain the property '{}'.",
                self.id, property_name
            ))
        })
    }

    /// Own and inherited end point definitions, root class first
    pub fn get_relation_end_point_definitions(&self) -> Vec<Arc<AnyRelationEndPointDefinition>> {
        let mut chain: Vec<&ClassDefinition> = self.ancestors().collect();
        chain.reverse();
        chain.push(self);

        chain
            .into_iter()
            .filter_map(|class| class.relation_end_point_definitions.get())
            .flat_map(|end_points| end_points.iter().cloned())
            .collect()
    }

    pub fn get_relation_end_point_definition(&self, property_name: &str) -> Option<Arc<AnyRelationEndPointDefinition>> {
        std::iter::once(self)
            .chain(self.ancestors())
            .find_map(|class| class.my_end_point(property_name))
            .cloned()
    }

    pub fn get_mandatory_relation_end_point_definition(
        &self,
        property_name: &str,
    ) -> MappingResult<Arc<AnyRelationEndPointDefinition>> {
        self.get_relation_end_point_definition(property_name)
            .ok_or_else(|| {
                MappingError::not_found(format!(
                    "Class '{}' does not contain the relation end point '{}'.",
                    self.id, property_name
                ))
            })
    }

    pub fn persistent_mixin_finder(&self) -> &PersistentMixinFinder {
        &self.persistent_mixin_finder
    }

    /// Persistent mixins introduced by this class
    pub fn persistent_mixins(&self) -> &[String] {
        self.persistent_mixin_finder.persistent_mixins()
    }

    /// Persistent mixin of this class or one of its base classes
    pub fn get_persistent_mixin(&self, mixin_type: &str) -> Option<&str> {
        std::iter::once(self)
            .chain(self.ancestors())
            .find_map(|class| class.persistent_mixin_finder.find_persistent_mixin(mixin_type))
    }

    pub fn storage_group_type(&self) -> Option<&str> {
        self.storage_group_type.as_deref()
    }

    pub fn storage_entity_definition(&self) -> Option<&StorageEntityDefinition> {
        self.storage_entity_definition.get()
    }

    pub fn set_storage_entity(&self, storage_entity: StorageEntityDefinition) -> MappingResult<()> {
        self.storage_entity_definition.set(storage_entity, || {
            format!("Storage entity has already been set for class '{}'.", self.id)
        })
    }

    pub fn storage_provider_id(&self) -> Option<&str> {
        self.storage_entity_definition
            .get()
            .map(StorageEntityDefinition::storage_provider_id)
    }

    /// Fails when the active mixin configuration no longer matches the one captured at build time
    pub fn validate_current_mixin_configuration(&self, active: &MixinConfiguration) -> MappingResult<()> {
        ClassDefinitionValidator::new(self).validate_current_mixin_configuration(active)
    }
}
