//! Builds the property definitions of a class

use std::sync::Arc;

use super::object_factory::MappingObjectFactory;
use crate::error::MappingResult;
use crate::model::{ClassDefinition, PropertyDefinitionCollection};
use crate::reflection::{ClassDeclaration, PropertyDeclaration, StorageClass};

/// Members a class introduces into the mapping, in declaration order.
///
/// Members of non-persistent mixins, members with storage class `None` and
/// overrides (already mapped by the class that introduced them) are left out.
pub fn introduced_members(declaration: &ClassDeclaration) -> impl Iterator<Item = &PropertyDeclaration> {
    declaration
        .mapped_members()
        .filter(|property| property.storage_class != StorageClass::None)
        .filter(|property| !property.info.is_override)
}

/// Introduced members that get a property definition; virtual relation sides do not
pub fn mapped_properties(declaration: &ClassDeclaration) -> Vec<&PropertyDeclaration> {
    introduced_members(declaration)
        .filter(|property| !property.is_virtual_relation())
        .collect()
}

pub struct PropertyDefinitionCollectionFactory<'a, F: MappingObjectFactory + ?Sized> {
    factory: &'a F,
}

impl<'a, F: MappingObjectFactory + ?Sized> PropertyDefinitionCollectionFactory<'a, F> {
    pub fn new(factory: &'a F) -> Self {
        Self { factory }
    }

    /// Create one definition per property, keeping order.
    ///
    /// The first failure aborts the batch; no partial collection is returned.
    pub fn create_property_definitions(
        &self,
        class_definition: &Arc<ClassDefinition>,
        properties: &[&PropertyDeclaration],
    ) -> MappingResult<PropertyDefinitionCollection> {
        let mut collection = PropertyDefinitionCollection::new();
        for property in properties {
            let property_definition = self.factory.create_property_definition(class_definition, property)?;
            collection.add(property_definition)?;
        }
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ReflectionBasedMappingObjectFactory;
    use crate::reflection::{MixinDeclaration, PropertyInfo, PropertyType, RelationAttribute, TypeInfo};

    fn customer_declaration() -> Arc<ClassDeclaration> {
        let customer = TypeInfo::new("Shop.Customer");
        Arc::new(
            ClassDeclaration::new(customer.clone())
                .with_base_type("Shop.Company")
                .with_property(PropertyDeclaration::new(
                    PropertyInfo::new("CustomerSince", customer.clone()),
                    PropertyType::DateTime,
                ))
                .with_property(
                    PropertyDeclaration::new(PropertyInfo::new("Cache", customer.clone()), PropertyType::String)
                        .with_storage_class(StorageClass::None),
                )
                .with_property(PropertyDeclaration::new(
                    PropertyInfo::overriding("Name", customer.clone(), TypeInfo::new("Shop.Company")),
                    PropertyType::String,
                ))
                .with_property(PropertyDeclaration::relation(
                    PropertyInfo::new("Orders", customer.clone()),
                    RelationAttribute::virtual_many("Shop.Order", "Customer"),
                ))
                .with_mixin(
                    MixinDeclaration::persistent(TypeInfo::new("Shop.RatingMixin")).with_property(
                        PropertyDeclaration::new(
                            PropertyInfo::new("Rating", TypeInfo::new("Shop.RatingMixin")),
                            PropertyType::Int32,
                        ),
                    ),
                )
                .with_mixin(
                    MixinDeclaration::non_persistent(TypeInfo::new("Shop.UiMixin")).with_property(
                        PropertyDeclaration::new(
                            PropertyInfo::new("Label", TypeInfo::new("Shop.UiMixin")),
                            PropertyType::String,
                        ),
                    ),
                ),
        )
    }

    #[test]
    fn test_mapped_properties_selection() {
        let declaration = customer_declaration();
        let names: Vec<_> = mapped_properties(&declaration)
            .iter()
            .map(|property| property.name())
            .collect();
        assert_eq!(names, vec!["CustomerSince", "Rating"]);

        let introduced: Vec<_> = introduced_members(&declaration).map(PropertyDeclaration::name).collect();
        assert_eq!(introduced, vec!["CustomerSince", "Orders", "Rating"]);
    }

    #[test]
    fn test_create_property_definitions_keeps_order() {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let declaration = Arc::new(ClassDeclaration::new(TypeInfo::new("Shop.Customer")));
        let class = factory.create_class_definition(&declaration, None).unwrap();
        let source = customer_declaration();

        let collection = PropertyDefinitionCollectionFactory::new(&factory)
            .create_property_definitions(&class, &mapped_properties(&source))
            .unwrap();
        let names: Vec<_> = collection.names().collect();
        assert_eq!(names, vec!["Shop.Customer.CustomerSince", "Shop.RatingMixin.Rating"]);
    }

    #[test]
    fn test_create_property_definitions_is_all_or_nothing() {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let declaration = Arc::new(ClassDeclaration::new(TypeInfo::new("Shop.Customer")));
        let class = factory.create_class_definition(&declaration, None).unwrap();

        let good = PropertyDeclaration::new(
            PropertyInfo::new("Name", TypeInfo::new("Shop.Customer")),
            PropertyType::String,
        );
        let bad = good.clone().with_storage_class(StorageClass::None);

        let result = PropertyDefinitionCollectionFactory::new(&factory)
            .create_property_definitions(&class, &[&good, &bad]);
        assert!(result.unwrap_err().is_configuration());
        assert!(class.my_property_definitions().is_err());
    }
}
