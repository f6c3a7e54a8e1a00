//! Nullability and length constraints derived from declarative attributes

use super::declarations::{PropertyAttribute, PropertyDeclaration};

/// Supplies the domain-model constraints of a property
pub trait DomainModelConstraintProvider: Send + Sync {
    fn is_nullable(&self, property: &PropertyDeclaration) -> bool;

    fn get_max_length(&self, property: &PropertyDeclaration) -> Option<u32>;
}

/// Reads constraints from `Mandatory`, `StringProperty` and `BinaryProperty` attributes
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeBasedConstraintProvider;

impl AttributeBasedConstraintProvider {
    pub fn new() -> Self {
        Self
    }
}

impl DomainModelConstraintProvider for AttributeBasedConstraintProvider {
    fn is_nullable(&self, property: &PropertyDeclaration) -> bool {
        if property.property_type.is_value_type() {
            return property.is_optional;
        }

        for attribute in &property.attributes {
            match attribute {
                PropertyAttribute::Mandatory => return false,
                PropertyAttribute::StringProperty { is_nullable, .. }
                | PropertyAttribute::BinaryProperty { is_nullable, .. } => return *is_nullable,
                PropertyAttribute::DbColumn(_) => {}
            }
        }

        true
    }

    fn get_max_length(&self, property: &PropertyDeclaration) -> Option<u32> {
        property.attributes.iter().find_map(|attribute| match attribute {
            PropertyAttribute::StringProperty { maximum_length, .. }
            | PropertyAttribute::BinaryProperty { maximum_length, .. } => *maximum_length,
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{PropertyInfo, PropertyType, TypeInfo};

    fn property(property_type: PropertyType) -> PropertyDeclaration {
        PropertyDeclaration::new(
            PropertyInfo::new("Value", TypeInfo::new("Shop.Item")),
            property_type,
        )
    }

    #[test]
    fn test_value_types() {
        let provider = AttributeBasedConstraintProvider::new();
        assert!(!provider.is_nullable(&property(PropertyType::Int32)));
        assert!(provider.is_nullable(&property(PropertyType::Int32).optional()));
        assert!(!provider.is_nullable(&property(PropertyType::DateTime)));
    }

    #[test]
    fn test_reference_types() {
        let provider = AttributeBasedConstraintProvider::new();
        assert!(provider.is_nullable(&property(PropertyType::String)));
        assert!(!provider.is_nullable(
            &property(PropertyType::String).with_attribute(PropertyAttribute::Mandatory)
        ));
        assert!(!provider.is_nullable(&property(PropertyType::ObjectId)
            .with_attribute(PropertyAttribute::Mandatory)));
    }

    #[test]
    fn test_string_property_attribute() {
        let provider = AttributeBasedConstraintProvider::new();
        let name = property(PropertyType::String).with_attribute(PropertyAttribute::StringProperty {
            is_nullable: false,
            maximum_length: Some(100),
        });
        assert!(!provider.is_nullable(&name));
        assert_eq!(provider.get_max_length(&name), Some(100));
        assert_eq!(provider.get_max_length(&property(PropertyType::String)), None);
    }

    #[test]
    fn test_binary_property_attribute() {
        let provider = AttributeBasedConstraintProvider::new();
        let data = property(PropertyType::Binary).with_attribute(PropertyAttribute::BinaryProperty {
            is_nullable: true,
            maximum_length: Some(1_000_000),
        });
        assert!(provider.is_nullable(&data));
        assert_eq!(provider.get_max_length(&data), Some(1_000_000));
    }
}
