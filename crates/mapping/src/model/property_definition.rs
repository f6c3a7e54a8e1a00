//! Property definitions

use std::sync::{Arc, Weak};

use super::class_definition::ClassDefinition;
use super::storage::StoragePropertyDefinition;
use crate::error::MappingResult;
use crate::reflection::{PropertyDeclaration, PropertyInfo, PropertyType, StorageClass};
use crate::write_once::WriteOnce;

/// One mapped property of a class
#[derive(Debug)]
pub struct PropertyDefinition {
    class_id: String,
    class_definition: Weak<ClassDefinition>,
    property_name: String,
    declaration: PropertyDeclaration,
    is_nullable: bool,
    max_length: Option<u32>,
    storage_property: WriteOnce<StoragePropertyDefinition>,
}

impl PropertyDefinition {
    pub fn new(
        class_definition: &Arc<ClassDefinition>,
        property_name: impl Into<String>,
        declaration: PropertyDeclaration,
        is_nullable: bool,
        max_length: Option<u32>,
    ) -> Self {
        Self {
            class_id: class_definition.id().to_string(),
            class_definition: Arc::downgrade(class_definition),
            property_name: property_name.into(),
            declaration,
            is_nullable,
            max_length,
            storage_property: WriteOnce::new(),
        }
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn class_definition(&self) -> Option<Arc<ClassDefinition>> {
        self.class_definition.upgrade()
    }

    /// Qualified property name
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// Unqualified member name as declared
    pub fn member_name(&self) -> &str {
        &self.declaration.info.name
    }

    pub fn declaration(&self) -> &PropertyDeclaration {
        &self.declaration
    }

    pub fn property_info(&self) -> &PropertyInfo {
        &self.declaration.info
    }

    pub fn property_type(&self) -> &PropertyType {
        &self.declaration.property_type
    }

    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    pub fn max_length(&self) -> Option<u32> {
        self.max_length
    }

    pub fn storage_class(&self) -> StorageClass {
        self.declaration.storage_class
    }

    /// Stored object reference (foreign key)
    pub fn is_object_id(&self) -> bool {
        self.declaration.property_type == PropertyType::ObjectId
    }

    pub fn storage_property(&self) -> Option<&StoragePropertyDefinition> {
        self.storage_property.get()
    }

    pub fn set_storage_property(&self, storage_property: StoragePropertyDefinition) -> MappingResult<()> {
        self.storage_property.set(storage_property, || {
            format!(
                "Storage property has already been set for property '{}' of class '{}'.",
                self.property_name, self.class_id
            )
        })
    }
}
