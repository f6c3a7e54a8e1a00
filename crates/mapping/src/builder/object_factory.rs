//! Mapping object factory
//!
//! The factory turns reflected declarations into definitions one entity at a
//! time. The collection factories drive it over whole classes and the whole
//! class set, and can be swapped together with it.

use std::sync::Arc;

use super::class_collection::ClassDefinitionCollectionFactory;
use super::end_point_collection::RelationEndPointDefinitionCollectionFactory;
use super::property_collection::{mapped_properties, PropertyDefinitionCollectionFactory};
use super::relation_collection::{RelationDefinitionBuildResult, RelationDefinitionCollectionFactory};
use crate::error::{MappingError, MappingResult};
use crate::mixins::PersistentMixinFinder;
use crate::model::{
    AnyRelationEndPointDefinition, ClassDefinition, ClassDefinitionCollection, PropertyDefinition,
    PropertyDefinitionCollection, PropertyNotFoundRelationEndPointDefinition,
    RelationEndPointDefinition, RelationEndPointDefinitionCollection, VirtualRelationEndPointDefinition,
};
use crate::reflection::{
    AttributeBasedConstraintProvider, CardinalityType, ClassDeclaration, DomainModelConstraintProvider,
    MappingNameResolver, PropertyDeclaration, ReflectionBasedNameResolver, StorageClass,
};

/// Strategy for creating mapping objects from reflected declarations
pub trait MappingObjectFactory: Send + Sync {
    /// Resolver used for qualified property names
    fn name_resolver(&self) -> &dyn MappingNameResolver;

    /// Create a class definition with empty collections
    fn create_class_definition(
        &self,
        declaration: &Arc<ClassDeclaration>,
        base_class: Option<&Arc<ClassDefinition>>,
    ) -> MappingResult<Arc<ClassDefinition>>;

    /// Create the definition of one non-virtual property
    fn create_property_definition(
        &self,
        class_definition: &Arc<ClassDefinition>,
        property: &PropertyDeclaration,
    ) -> MappingResult<Arc<PropertyDefinition>>;

    /// Create the end point of one relation property
    fn create_relation_end_point_definition(
        &self,
        class_definition: &Arc<ClassDefinition>,
        property: &PropertyDeclaration,
    ) -> MappingResult<Arc<AnyRelationEndPointDefinition>>;

    /// Create all class definitions, base classes first
    fn create_class_definition_collection(
        &self,
        declarations: &[Arc<ClassDeclaration>],
    ) -> MappingResult<ClassDefinitionCollection> {
        ClassDefinitionCollectionFactory::new(self).create_class_definition_collection(declarations)
    }

    /// Create the property definitions a class introduces
    fn create_property_definition_collection(
        &self,
        class_definition: &Arc<ClassDefinition>,
    ) -> MappingResult<PropertyDefinitionCollection> {
        let Some(declaration) = class_definition.declaration() else {
            return Ok(PropertyDefinitionCollection::new());
        };
        PropertyDefinitionCollectionFactory::new(self)
            .create_property_definitions(class_definition, &mapped_properties(declaration))
    }

    /// Create the end point definitions a class introduces
    fn create_relation_end_point_definition_collection(
        &self,
        class_definition: &Arc<ClassDefinition>,
    ) -> MappingResult<RelationEndPointDefinitionCollection> {
        RelationEndPointDefinitionCollectionFactory::new(self)
            .create_relation_end_point_definition_collection(class_definition)
    }

    /// Pair up the end points of all classes into relations
    fn create_relation_definition_collection(
        &self,
        class_definitions: &ClassDefinitionCollection,
    ) -> MappingResult<RelationDefinitionBuildResult> {
        RelationDefinitionCollectionFactory::new(self).create_relation_definition_collection(class_definitions)
    }
}

/// Default factory reading declarations and their attributes
pub struct ReflectionBasedMappingObjectFactory {
    name_resolver: Arc<dyn MappingNameResolver>,
    constraint_provider: Arc<dyn DomainModelConstraintProvider>,
}

impl ReflectionBasedMappingObjectFactory {
    pub fn new(
        name_resolver: Arc<dyn MappingNameResolver>,
        constraint_provider: Arc<dyn DomainModelConstraintProvider>,
    ) -> Self {
        Self {
            name_resolver,
            constraint_provider,
        }
    }

    fn check_base_class(
        declaration: &ClassDeclaration,
        base_class: Option<&Arc<ClassDefinition>>,
    ) -> MappingResult<()> {
        match (declaration.base_type.as_deref(), base_class) {
            (Some(base_type), Some(base)) if base.class_type_name() != base_type => {
                Err(MappingError::configuration(format!(
                    "Class '{}' derives from '{}', but was given base class '{}' of type '{}'.",
                    declaration.type_name(),
                    base_type,
                    base.id(),
                    base.class_type_name()
                )))
            }
            (None, Some(base)) => Err(MappingError::configuration(format!(
                "Class '{}' has no base type, but was given base class '{}'.",
                declaration.type_name(),
                base.id()
            ))),
            _ => Ok(()),
        }
    }
}

impl Default for ReflectionBasedMappingObjectFactory {
    fn default() -> Self {
        Self::new(
            Arc::new(ReflectionBasedNameResolver::new()),
            Arc::new(AttributeBasedConstraintProvider::new()),
        )
    }
}

impl std::fmt::Debug for ReflectionBasedMappingObjectFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReflectionBasedMappingObjectFactory").finish_non_exhaustive()
    }
}

impl MappingObjectFactory for ReflectionBasedMappingObjectFactory {
    fn name_resolver(&self) -> &dyn MappingNameResolver {
        self.name_resolver.as_ref()
    }

    fn create_class_definition(
        &self,
        declaration: &Arc<ClassDeclaration>,
        base_class: Option<&Arc<ClassDefinition>>,
    ) -> MappingResult<Arc<ClassDefinition>> {
        Self::check_base_class(declaration, base_class)?;

        let class_definition = ClassDefinition::new(
            declaration.class_id().to_string(),
            declaration.clone(),
            base_class.cloned(),
            PersistentMixinFinder::from_declaration(declaration),
        );
        tracing::debug!(
            "Created class definition '{}' for type '{}'",
            class_definition.id(),
            class_definition.class_type_name()
        );
        Ok(Arc::new(class_definition))
    }

    fn create_property_definition(
        &self,
        class_definition: &Arc<ClassDefinition>,
        property: &PropertyDeclaration,
    ) -> MappingResult<Arc<PropertyDefinition>> {
        if property.storage_class == StorageClass::None {
            return Err(MappingError::configuration(format!(
                "Property '{}' of class '{}' has storage class 'None' and cannot be mapped.",
                property.name(),
                class_definition.id()
            )));
        }
        if property.is_virtual_relation() {
            return Err(MappingError::configuration(format!(
                "Property '{}' of class '{}' is a virtual relation property and has no property definition.",
                property.name(),
                class_definition.id()
            )));
        }

        let property_name = self.name_resolver.get_property_name(&property.info)?;
        let mandatory_relation = property
            .relation
            .as_ref()
            .is_some_and(|relation| relation.is_mandatory);
        let is_nullable = self.constraint_provider.is_nullable(property) && !mandatory_relation;
        let max_length = self.constraint_provider.get_max_length(property);

        Ok(Arc::new(PropertyDefinition::new(
            class_definition,
            property_name,
            property.clone(),
            is_nullable,
            max_length,
        )))
    }

    fn create_relation_end_point_definition(
        &self,
        class_definition: &Arc<ClassDefinition>,
        property: &PropertyDeclaration,
    ) -> MappingResult<Arc<AnyRelationEndPointDefinition>> {
        let Some(relation) = property.relation.as_ref() else {
            return Err(MappingError::configuration(format!(
                "Property '{}' of class '{}' is not a relation property.",
                property.name(),
                class_definition.id()
            )));
        };
        if relation.contains_foreign_key && relation.cardinality == CardinalityType::Many {
            return Err(MappingError::configuration(format!(
                "Property '{}' of class '{}' is a collection, and a collection cannot contain the foreign key.",
                property.name(),
                class_definition.id()
            )));
        }

        let property_name = self.name_resolver.get_property_name(&property.info)?;
        if relation.sort_expression.is_some() && relation.cardinality == CardinalityType::One {
            return Err(MappingError::configuration(format!(
                "Property '{}' of class '{}' has a sort expression, but only relation end points with cardinality 'Many' can have one.",
                property_name,
                class_definition.id()
            )));
        }

        let end_point = if relation.is_virtual() {
            AnyRelationEndPointDefinition::Virtual(VirtualRelationEndPointDefinition::new(
                class_definition,
                property_name,
                property.info.clone(),
                relation.is_mandatory,
                relation.cardinality,
                property.property_type.clone(),
                relation.sort_expression.clone(),
            )?)
        } else {
            let property_definition = class_definition
                .my_property_definitions()?
                .get(&property_name)
                .cloned();
            match property_definition {
                Some(property_definition) => AnyRelationEndPointDefinition::Real(
                    RelationEndPointDefinition::new(class_definition, property_definition, relation.is_mandatory)?,
                ),
                None => AnyRelationEndPointDefinition::PropertyNotFound(
                    PropertyNotFoundRelationEndPointDefinition::new(class_definition, property_name),
                ),
            }
        };

        Ok(Arc::new(end_point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelationEndPoint;
    use crate::reflection::{PropertyAttribute, PropertyInfo, PropertyType, RelationAttribute, TypeInfo};

    fn order_declaration() -> Arc<ClassDeclaration> {
        Arc::new(
            ClassDeclaration::new(TypeInfo::new("Shop.Order"))
                .with_property(
                    PropertyDeclaration::new(PropertyInfo::new("Number", TypeInfo::new("Shop.Order")), PropertyType::Int32),
                )
                .with_property(PropertyDeclaration::relation(
                    PropertyInfo::new("Customer", TypeInfo::new("Shop.Order")),
                    RelationAttribute::foreign_key("Shop.Customer", Some("Orders")).mandatory(),
                ))
                .with_property(PropertyDeclaration::relation(
                    PropertyInfo::new("OrderItems", TypeInfo::new("Shop.Order")),
                    RelationAttribute::virtual_many("Shop.OrderItem", "Order").with_sort_expression("Position desc"),
                )),
        )
    }

    #[test]
    fn test_create_class_definition() {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let declaration = Arc::new(ClassDeclaration::new(TypeInfo::new("Shop.Order")).with_storage_group("Archive"));
        let class = factory.create_class_definition(&declaration, None).unwrap();

        assert_eq!(class.id(), "Order");
        assert_eq!(class.class_type_name(), "Shop.Order");
        assert_eq!(class.storage_group_type(), Some("Archive"));
        assert!(class.my_property_definitions().unwrap_err().is_not_found());
    }

    #[test]
    fn test_create_class_definition_with_wrong_base() {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let company = factory
            .create_class_definition(&Arc::new(ClassDeclaration::new(TypeInfo::new("Shop.Company"))), None)
            .unwrap();
        let customer = Arc::new(ClassDeclaration::new(TypeInfo::new("Shop.Customer")).with_base_type("Shop.Partner"));

        let err = factory.create_class_definition(&customer, Some(&company)).unwrap_err();
        assert!(err.is_configuration());

        let plain = Arc::new(ClassDeclaration::new(TypeInfo::new("Shop.Order")));
        assert!(factory.create_class_definition(&plain, Some(&company)).is_err());
    }

    #[test]
    fn test_create_property_definition() {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let declaration = order_declaration();
        let order = factory.create_class_definition(&declaration, None).unwrap();

        let number = factory
            .create_property_definition(&order, &declaration.properties[0])
            .unwrap();
        assert_eq!(number.property_name(), "Shop.Order.Number");
        assert!(!number.is_nullable());

        let customer = factory
            .create_property_definition(&order, &declaration.properties[1])
            .unwrap();
        assert!(customer.is_object_id());
        assert!(!customer.is_nullable());

        let err = factory
            .create_property_definition(&order, &declaration.properties[2])
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_string_constraints_are_applied() {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let declaration = order_declaration();
        let order = factory.create_class_definition(&declaration, None).unwrap();
        let comment = PropertyDeclaration::new(PropertyInfo::new("Comment", TypeInfo::new("Shop.Order")), PropertyType::String)
            .with_attribute(PropertyAttribute::StringProperty {
                is_nullable: false,
                maximum_length: Some(200),
            });

        let property = factory.create_property_definition(&order, &comment).unwrap();
        assert!(!property.is_nullable());
        assert_eq!(property.max_length(), Some(200));

        let transient = comment.clone().with_storage_class(StorageClass::None);
        assert!(factory.create_property_definition(&order, &transient).is_err());
    }

    #[test]
    fn test_create_end_points() {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let declaration = order_declaration();
        let order = factory.create_class_definition(&declaration, None).unwrap();
        order
            .set_property_definitions(factory.create_property_definition_collection(&order).unwrap())
            .unwrap();

        let customer = factory
            .create_relation_end_point_definition(&order, &declaration.properties[1])
            .unwrap();
        assert!(customer.as_real().is_some());
        assert!(customer.is_mandatory());

        let items = factory
            .create_relation_end_point_definition(&order, &declaration.properties[2])
            .unwrap();
        let items = items.as_virtual().unwrap();
        assert_eq!(items.cardinality(), CardinalityType::Many);
        assert_eq!(items.sort_expression_text(), Some("Position desc"));

        let err = factory
            .create_relation_end_point_definition(&order, &declaration.properties[0])
            .unwrap_err();
        assert!(err.to_string().contains("is not a relation property"));
    }

    #[test]
    fn test_collection_with_foreign_key_rejected() {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let declaration = order_declaration();
        let order = factory.create_class_definition(&declaration, None).unwrap();
        let mut relation = RelationAttribute::virtual_many("Shop.OrderItem", "Order");
        relation.contains_foreign_key = true;
        let property = PropertyDeclaration::relation(
            PropertyInfo::new("OrderItems", TypeInfo::new("Shop.Order")),
            relation,
        );

        let err = factory
            .create_relation_end_point_definition(&order, &property)
            .unwrap_err();
        assert!(err.to_string().contains("cannot contain the foreign key"));
    }

    #[test]
    fn test_sort_expression_on_foreign_key_rejected() {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let declaration = order_declaration();
        let order = factory.create_class_definition(&declaration, None).unwrap();
        order
            .set_property_definitions(factory.create_property_definition_collection(&order).unwrap())
            .unwrap();
        let property = PropertyDeclaration::relation(
            PropertyInfo::new("Customer", TypeInfo::new("Shop.Order")),
            RelationAttribute::foreign_key("Shop.Customer", Some("Orders")).with_sort_expression("Name asc"),
        );

        let err = factory
            .create_relation_end_point_definition(&order, &property)
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Property 'Shop.Order.Customer' of class 'Order' has a sort expression, but only relation end points with cardinality 'Many' can have one."
        );
    }
}
