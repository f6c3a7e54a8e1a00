//! Qualified property names
//!
//! A mapped property is identified by `<DeclaringTypeFullName>.<MemberName>`.
//! Overrides keep the identity of the member they override, shadowing members
//! get their own, and closed generic types use their open definition.

use dashmap::DashMap;

use super::declarations::{PropertyInfo, PropertyInfoId};
use crate::error::{MappingError, MappingResult};

/// Derives the globally unique mapping name of a property
pub trait MappingNameResolver: Send + Sync {
    fn get_property_name(&self, property: &PropertyInfo) -> MappingResult<String>;
}

/// Name resolver with a per-descriptor cache, safe for concurrent lookups
#[derive(Debug, Default)]
pub struct ReflectionBasedNameResolver {
    cache: DashMap<PropertyInfoId, String>,
}

impl ReflectionBasedNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of descriptors resolved so far
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    fn resolve(property: &PropertyInfo) -> MappingResult<String> {
        let declaring_type = if property.is_override {
            property
                .original_declaring_type
                .as_ref()
                .unwrap_or(&property.declaring_type)
        } else {
            &property.declaring_type
        };

        let type_name = declaring_type.name_for_mapping();
        if type_name.is_empty() {
            return Err(MappingError::Reflection(format!(
                "Property '{}' has no declaring type name",
                property.name
            )));
        }
        if property.name.is_empty() {
            return Err(MappingError::Reflection(format!(
                "Type '{}' declares a property without a name",
                type_name
            )));
        }

        Ok(format!("{}.{}", type_name, property.name))
    }
}

impl MappingNameResolver for ReflectionBasedNameResolver {
    fn get_property_name(&self, property: &PropertyInfo) -> MappingResult<String> {
        if let Some(cached) = self.cache.get(&property.id()) {
            return Ok(cached.value().clone());
        }

        let name = Self::resolve(property)?;
        let entry = self.cache.entry(property.id()).or_insert(name);
        Ok(entry.value().clone())
    }
}
