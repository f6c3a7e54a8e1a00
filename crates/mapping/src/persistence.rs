//! Persistence model
//!
//! After the class graph is built, a [`PersistenceModelLoader`] attaches
//! storage entities and columns to every class of an inheritance hierarchy.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::MappingConfig;
use crate::error::{MappingError, MappingResult};
use crate::model::{ClassDefinition, StorageEntityDefinition, StoragePropertyDefinition, StorageProviderDefinition};
use crate::reflection::PropertyType;

/// Picks the storage provider a class is persisted through
pub trait StorageProviderDefinitionFinder: Send + Sync {
    fn get_storage_provider_definition(
        &self,
        class_definition: &ClassDefinition,
    ) -> MappingResult<StorageProviderDefinition>;
}

/// Maps storage groups to providers as configured; classes without a group use the default provider
#[derive(Debug, Clone)]
pub struct StorageGroupBasedStorageProviderDefinitionFinder {
    config: MappingConfig,
}

impl StorageGroupBasedStorageProviderDefinitionFinder {
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }
}

impl StorageProviderDefinitionFinder for StorageGroupBasedStorageProviderDefinitionFinder {
    fn get_storage_provider_definition(
        &self,
        class_definition: &ClassDefinition,
    ) -> MappingResult<StorageProviderDefinition> {
        let provider = self
            .config
            .provider_for_storage_group(class_definition.storage_group_type());
        Ok(StorageProviderDefinition::new(provider))
    }
}

/// Attaches storage metadata to a class hierarchy
pub trait PersistenceModelLoader: Send + Sync {
    /// Called once per inheritance root, after all relations exist
    fn apply_persistence_model_to_hierarchy(
        &self,
        root: &Arc<ClassDefinition>,
        finder: &dyn StorageProviderDefinitionFinder,
    ) -> MappingResult<()>;
}

/// Stores a whole hierarchy in the root's table; derived classes get filter views
#[derive(Debug, Clone, Copy, Default)]
pub struct TablePerHierarchyPersistenceModelLoader;

impl TablePerHierarchyPersistenceModelLoader {
    pub fn new() -> Self {
        Self
    }

    fn column_name(property_name: &str, db_column: Option<&str>, property_type: &PropertyType) -> String {
        match db_column {
            Some(column) => column.to_string(),
            None if *property_type == PropertyType::ObjectId => format!("{}ID", property_name),
            None => property_name.to_string(),
        }
    }

    /// Assign a column to every property the class introduces. `columns` maps the
    /// columns already used in the hierarchy's table to the owning property.
    fn apply_to_properties(
        class_definition: &ClassDefinition,
        table_name: &str,
        columns: &mut HashMap<String, String>,
    ) -> MappingResult<()> {
        for property in class_definition.my_property_definitions()?.iter() {
            let column = Self::column_name(
                property.member_name(),
                property.declaration().db_column(),
                property.property_type(),
            );
            if let Some(existing) = columns.get(&column) {
                return Err(MappingError::configuration(format!(
                    "Property '{}' of class '{}' is stored in column '{}' of table '{}', which is already used by property '{}' of the same inheritance hierarchy. Use a DbColumn attribute to give one of them a distinct column name.",
                    property.property_name(),
                    class_definition.id(),
                    column,
                    table_name,
                    existing
                )));
            }
            columns.insert(column.clone(), property.property_name().to_string());
            property.set_storage_property(StoragePropertyDefinition::new(column, property.is_nullable()))?;
        }
        Ok(())
    }

    /// The class itself and all classes derived from it
    fn hierarchy_ids(class_definition: &ClassDefinition) -> Vec<String> {
        let mut ids = vec![class_definition.id().to_string()];
        let mut pending = class_definition.derived_classes();
        while let Some(derived) = pending.pop() {
            ids.push(derived.id().to_string());
            pending.extend(derived.derived_classes());
        }
        ids
    }
}

impl PersistenceModelLoader for TablePerHierarchyPersistenceModelLoader {
    fn apply_persistence_model_to_hierarchy(
        &self,
        root: &Arc<ClassDefinition>,
        finder: &dyn StorageProviderDefinitionFinder,
    ) -> MappingResult<()> {
        let provider = finder.get_storage_provider_definition(root)?;
        let table_name = root
            .declaration()
            .and_then(|declaration| declaration.table_name.clone())
            .unwrap_or_else(|| root.id().to_string());

        root.set_storage_entity(StorageEntityDefinition::Table {
            table_name: table_name.clone(),
            storage_provider_id: provider.name.clone(),
        })?;
        let mut columns = HashMap::new();
        Self::apply_to_properties(root, &table_name, &mut columns)?;

        let mut pending = root.derived_classes();
        while let Some(derived) = pending.pop() {
            let derived_provider = finder.get_storage_provider_definition(&derived)?;
            if derived_provider.name != provider.name {
                return Err(MappingError::configuration(format!(
                    "Class '{}' is stored through provider '{}', but its inheritance root '{}' uses provider '{}'. All classes of a hierarchy must use the same storage provider.",
                    derived.id(),
                    derived_provider.name,
                    root.id(),
                    provider.name
                )));
            }

            derived.set_storage_entity(StorageEntityDefinition::FilterView {
                view_name: format!("{}View", derived.id()),
                base_entity_name: table_name.clone(),
                class_ids: Self::hierarchy_ids(&derived),
                storage_provider_id: provider.name.clone(),
            })?;
            Self::apply_to_properties(&derived, &table_name, &mut columns)?;
            pending.extend(derived.derived_classes());
        }

        tracing::debug!(
            "Applied persistence model to hierarchy of '{}' (provider '{}')",
            root.id(),
            provider.name
        );
        Ok(())
    }
}
