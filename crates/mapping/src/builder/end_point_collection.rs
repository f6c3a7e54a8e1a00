//! Builds the relation end point definitions of a class

use std::sync::Arc;

use super::object_factory::MappingObjectFactory;
use super::property_collection::introduced_members;
use crate::error::{MappingError, MappingResult};
use crate::model::{ClassDefinition, RelationEndPoint, RelationEndPointDefinitionCollection};

pub struct RelationEndPointDefinitionCollectionFactory<'a, F: MappingObjectFactory + ?Sized> {
    factory: &'a F,
}

impl<'a, F: MappingObjectFactory + ?Sized> RelationEndPointDefinitionCollectionFactory<'a, F> {
    pub fn new(factory: &'a F) -> Self {
        Self { factory }
    }

    /// One end point per relation member the class introduces.
    ///
    /// Real end points need the class's property definitions to be set already.
    pub fn create_relation_end_point_definition_collection(
        &self,
        class_definition: &Arc<ClassDefinition>,
    ) -> MappingResult<RelationEndPointDefinitionCollection> {
        let mut collection = RelationEndPointDefinitionCollection::new();
        let Some(declaration) = class_definition.declaration() else {
            return Ok(collection);
        };

        for property in introduced_members(declaration).filter(|property| property.is_relation()) {
            let property_name = self.factory.name_resolver().get_property_name(&property.info)?;
            let end_point = self
                .factory
                .create_relation_end_point_definition(class_definition, property)?;

            if end_point.property_name() != Some(property_name.as_str()) {
                return Err(MappingError::configuration(format!(
                    "End point for property '{}' of class '{}' was created with name '{}'.",
                    property_name,
                    class_definition.id(),
                    end_point.property_name().unwrap_or("<anonymous>")
                )));
            }
            collection.add(end_point)?;
        }

        Ok(collection)
    }
}
