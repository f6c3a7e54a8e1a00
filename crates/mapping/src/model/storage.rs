//! Storage-side metadata attached to classes and properties by the persistence model loader

use serde::{Deserialize, Serialize};

/// A named storage provider a class hierarchy is persisted through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProviderDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl StorageProviderDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Where the instances of a class are stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageEntityDefinition {
    /// A table holding a whole inheritance hierarchy
    Table {
        table_name: String,
        storage_provider_id: String,
    },
    /// A filtered view over the hierarchy table for a derived class and its descendants
    FilterView {
        view_name: String,
        base_entity_name: String,
        class_ids: Vec<String>,
        storage_provider_id: String,
    },
}

impl StorageEntityDefinition {
    pub fn name(&self) -> &str {
        match self {
            Self::Table { table_name, .. } => table_name,
            Self::FilterView { view_name, .. } => view_name,
        }
    }

    pub fn storage_provider_id(&self) -> &str {
        match self {
            Self::Table {
                storage_provider_id,
                ..
            }
            | Self::FilterView {
                storage_provider_id,
                ..
            } => storage_provider_id,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table { .. })
    }
}

/// Column a property is stored in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePropertyDefinition {
    pub column_name: String,
    pub is_nullable: bool,
}

impl StoragePropertyDefinition {
    pub fn new(column_name: impl Into<String>, is_nullable: bool) -> Self {
        Self {
            column_name: column_name.into(),
            is_nullable,
        }
    }
}
