//! Mapping loader
//!
//! Runs the build pipeline over a set of class declarations and returns the
//! sealed, read-only [`MappingConfiguration`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::builder::{MappingObjectFactory, ReflectionBasedMappingObjectFactory, RelationDefinitionBuildResult};
use crate::config::MappingConfig;
use crate::error::{MappingError, MappingResult};
use crate::mixins::MixinConfiguration;
use crate::model::{
    AnyRelationEndPointDefinition, ClassDefinition, ClassDefinitionCollection, PropertyDefinition,
    RelationDefinition, RelationDefinitionCollection, RelationEndPoint,
};
use crate::persistence::{
    PersistenceModelLoader, StorageGroupBasedStorageProviderDefinitionFinder, StorageProviderDefinitionFinder,
    TablePerHierarchyPersistenceModelLoader,
};
use crate::reflection::ClassDeclaration;
use crate::validation::MappingValidator;

/// Builds mapping configurations
pub struct MappingLoader {
    config: MappingConfig,
    object_factory: Arc<dyn MappingObjectFactory>,
    persistence_model_loader: Arc<dyn PersistenceModelLoader>,
    storage_provider_finder: Arc<dyn StorageProviderDefinitionFinder>,
}

impl MappingLoader {
    pub fn new(config: MappingConfig) -> Self {
        Self {
            storage_provider_finder: Arc::new(StorageGroupBasedStorageProviderDefinitionFinder::new(config.clone())),
            config,
            object_factory: Arc::new(ReflectionBasedMappingObjectFactory::default()),
            persistence_model_loader: Arc::new(TablePerHierarchyPersistenceModelLoader::new()),
        }
    }

    pub fn with_object_factory(mut self, object_factory: Arc<dyn MappingObjectFactory>) -> Self {
        self.object_factory = object_factory;
        self
    }

    pub fn with_persistence_model_loader(mut self, loader: Arc<dyn PersistenceModelLoader>) -> Self {
        self.persistence_model_loader = loader;
        self
    }

    pub fn with_storage_provider_finder(mut self, finder: Arc<dyn StorageProviderDefinitionFinder>) -> Self {
        self.storage_provider_finder = finder;
        self
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Build the mapping for `declarations`.
    ///
    /// `active_mixins` is only consulted when mixin validation on load is enabled.
    pub fn load(
        &self,
        declarations: &[ClassDeclaration],
        active_mixins: &MixinConfiguration,
    ) -> MappingResult<MappingConfiguration> {
        self.config.validate()?;

        let declarations: Vec<Arc<ClassDeclaration>> = declarations.iter().cloned().map(Arc::new).collect();
        let factory = self.object_factory.as_ref();

        let classes = factory.create_class_definition_collection(&declarations)?;
        for class in classes.iter() {
            class.set_property_definitions(factory.create_property_definition_collection(class)?)?;
        }
        for class in classes.iter() {
            class.set_relation_end_point_definitions(factory.create_relation_end_point_definition_collection(class)?)?;
        }

        let RelationDefinitionBuildResult {
            relation_definitions,
            type_not_found_classes,
            messages,
        } = factory.create_relation_definition_collection(&classes)?;

        for root in classes.inheritance_root_classes() {
            self.persistence_model_loader
                .apply_persistence_model_to_hierarchy(&root, self.storage_provider_finder.as_ref())?;
        }

        if self.config.validate_mapping {
            MappingValidator::new(&relation_definitions)
                .validate()
                .with_messages(messages)
                .into_result()?;
        } else if !messages.is_empty() {
            tracing::warn!(
                "Mapping validation is disabled; ignoring {} relation problems",
                messages.len()
            );
        }

        let mapping = MappingConfiguration::new(classes, type_not_found_classes, relation_definitions);
        if self.config.validate_mixins_on_load {
            mapping.validate_current_mixin_configuration(active_mixins)?;
        }

        tracing::info!(
            "Loaded mapping with {} classes and {} relations",
            mapping.class_definitions().len(),
            mapping.relation_definitions().len()
        );
        Ok(mapping)
    }

    /// Deserialize a JSON array of class declarations and load it
    pub fn load_from_json(&self, json: &str, active_mixins: &MixinConfiguration) -> MappingResult<MappingConfiguration> {
        let declarations: Vec<ClassDeclaration> = serde_json::from_str(json)?;
        self.load(&declarations, active_mixins)
    }
}

impl Default for MappingLoader {
    fn default() -> Self {
        Self::new(MappingConfig::default())
    }
}

/// The sealed mapping graph
#[derive(Debug)]
pub struct MappingConfiguration {
    class_definitions: ClassDefinitionCollection,
    type_not_found_classes: ClassDefinitionCollection,
    relation_definitions: RelationDefinitionCollection,
    /// qualified property name -> definition; a mixin property applied to several classes maps to the first
    property_definitions: HashMap<String, Arc<PropertyDefinition>>,
    end_point_definitions: HashMap<String, Arc<AnyRelationEndPointDefinition>>,
}

impl MappingConfiguration {
    fn new(
        class_definitions: ClassDefinitionCollection,
        type_not_found_classes: ClassDefinitionCollection,
        relation_definitions: RelationDefinitionCollection,
    ) -> Self {
        let mut property_definitions = HashMap::new();
        let mut end_point_definitions = HashMap::new();

        for class in class_definitions.iter() {
            if let Ok(properties) = class.my_property_definitions() {
                for property in properties.iter() {
                    property_definitions
                        .entry(property.property_name().to_string())
                        .or_insert_with(|| property.clone());
                }
            }
            if let Ok(end_points) = class.my_relation_end_point_definitions() {
                for end_point in end_points.iter() {
                    if let Some(name) = end_point.property_name() {
                        end_point_definitions
                            .entry(name.to_string())
                            .or_insert_with(|| end_point.clone());
                    }
                }
            }
        }

        Self {
            class_definitions,
            type_not_found_classes,
            relation_definitions,
            property_definitions,
            end_point_definitions,
        }
    }

    pub fn class_definitions(&self) -> &ClassDefinitionCollection {
        &self.class_definitions
    }

    pub fn relation_definitions(&self) -> &RelationDefinitionCollection {
        &self.relation_definitions
    }

    /// Stand-ins for related types that are not part of the mapping
    pub fn type_not_found_classes(&self) -> &ClassDefinitionCollection {
        &self.type_not_found_classes
    }

    pub fn get_class_definition(&self, class_id: &str) -> Option<&Arc<ClassDefinition>> {
        self.class_definitions.get(class_id)
    }

    pub fn get_mandatory_class_definition(&self, class_id: &str) -> MappingResult<&Arc<ClassDefinition>> {
        self.class_definitions.get_mandatory(class_id)
    }

    pub fn get_type_definition(&self, type_name: &str) -> Option<&Arc<ClassDefinition>> {
        self.class_definitions.get_by_type(type_name)
    }

    pub fn get_mandatory_type_definition(&self, type_name: &str) -> MappingResult<&Arc<ClassDefinition>> {
        self.class_definitions.get_mandatory_by_type(type_name)
    }

    pub fn get_property_definition(&self, property_name: &str) -> Option<&Arc<PropertyDefinition>> {
        self.property_definitions.get(property_name)
    }

    pub fn get_mandatory_property_definition(&self, property_name: &str) -> MappingResult<&Arc<PropertyDefinition>> {
        self.get_property_definition(property_name).ok_or_else(|| {
            MappingError::not_found(format!(
                "Mapping does not contain property '{}'.",
                property_name
            ))
        })
    }

    pub fn get_relation_end_point_definition(
        &self,
        property_name: &str,
    ) -> Option<&Arc<AnyRelationEndPointDefinition>> {
        self.end_point_definitions.get(property_name)
    }

    pub fn get_mandatory_relation_end_point_definition(
        &self,
        property_name: &str,
    ) -> MappingResult<&Arc<AnyRelationEndPointDefinition>> {
        self.get_relation_end_point_definition(property_name)
            .ok_or_else(|| {
                MappingError::not_found(format!(
                    "Mapping does not contain relation end point '{}'.",
                    property_name
                ))
            })
    }

    pub fn get_relation_definition(&self, relation_id: &str) -> Option<&Arc<RelationDefinition>> {
        self.relation_definitions.get(relation_id)
    }

    pub fn get_mandatory_relation_definition(&self, relation_id: &str) -> MappingResult<&Arc<RelationDefinition>> {
        self.relation_definitions.get_mandatory(relation_id)
    }

    pub fn get_inheritance_root_classes(&self) -> Vec<Arc<ClassDefinition>> {
        self.class_definitions.inheritance_root_classes()
    }

    /// Fails on the first class whose mixins changed since the mapping was built
    pub fn validate_current_mixin_configuration(&self, active: &MixinConfiguration) -> MappingResult<()> {
        for class in self.class_definitions.iter() {
            class.validate_current_mixin_configuration(active)?;
        }
        Ok(())
    }
}
