//! Pairs end points into relation definitions
//!
//! Runs after every class has its property and end point definitions. Each
//! unordered pair of end points yields exactly one relation. References that
//! cannot be resolved produce sentinel end points so the validator can report
//! all of them at once instead of failing on the first.

use std::sync::Arc;

use indexmap::IndexMap;

use super::object_factory::MappingObjectFactory;
use super::property_collection::introduced_members;
use super::sort_expression_parser::SortExpressionDefinitionParser;
use crate::error::{MappingError, MappingResult};
use crate::model::{
    AnonymousRelationEndPointDefinition, AnyRelationEndPointDefinition, ClassDefinition,
    ClassDefinitionCollection, PropertyNotFoundRelationEndPointDefinition, RelationDefinition,
    RelationDefinitionCollection, RelationEndPoint, TypeNotFoundRelationEndPointDefinition,
};
use crate::reflection::{RelationAttribute, TypeInfo};

/// Outcome of relation assembly
#[derive(Debug, Default)]
pub struct RelationDefinitionBuildResult {
    pub relation_definitions: RelationDefinitionCollection,
    /// Stand-ins for related types that are not part of the mapping
    pub type_not_found_classes: ClassDefinitionCollection,
    /// Problems found while pairing end points
    pub messages: Vec<String>,
}

pub struct RelationDefinitionCollectionFactory<'a, F: MappingObjectFactory + ?Sized> {
    factory: &'a F,
}

impl<'a, F: MappingObjectFactory + ?Sized> RelationDefinitionCollectionFactory<'a, F> {
    pub fn new(factory: &'a F) -> Self {
        Self { factory }
    }

    pub fn create_relation_definition_collection(
        &self,
        class_definitions: &ClassDefinitionCollection,
    ) -> MappingResult<RelationDefinitionBuildResult> {
        let mut result = RelationDefinitionBuildResult::default();
        let mut type_not_found: IndexMap<String, Arc<ClassDefinition>> = IndexMap::new();

        for class_definition in class_definitions.iter() {
            for end_point in class_definition.my_relation_end_point_definitions()?.iter() {
                if end_point.relation_definition().is_some() {
                    continue;
                }

                let relation = self.find_relation_attribute(class_definition, end_point)?;
                let opposite = match class_definitions.get_by_type(&relation.opposite_type) {
                    Some(opposite_class) => {
                        match self.find_opposite_end_point(opposite_class, &relation)? {
                            OppositeEndPoint::Found(opposite) => {
                                if let Some(existing) = opposite.relation_definition() {
                                    result.messages.push(format!(
                                        "Relation property '{}' on class '{}' declares '{}' as its opposite, but that end point already belongs to relation '{}'.",
                                        end_point.property_name().unwrap_or_default(),
                                        class_definition.id(),
                                        opposite.identity(),
                                        existing.id()
                                    ));
                                    continue;
                                }
                                opposite
                            }
                            OppositeEndPoint::Missing(property_name) => {
                                Arc::new(AnyRelationEndPointDefinition::PropertyNotFound(
                                    PropertyNotFoundRelationEndPointDefinition::new(opposite_class, property_name),
                                ))
                            }
                            OppositeEndPoint::Anonymous => Arc::new(AnyRelationEndPointDefinition::Anonymous(
                                AnonymousRelationEndPointDefinition::new(opposite_class),
                            )),
                        }
                    }
                    None => {
                        let missing_class = type_not_found
                            .entry(relation.opposite_type.clone())
                            .or_insert_with(|| {
                                Arc::new(ClassDefinition::type_not_found(
                                    relation.opposite_type.clone(),
                                    TypeInfo::new(relation.opposite_type.clone()),
                                ))
                            })
                            .clone();
                        let property_name = relation
                            .opposite_property
                            .as_ref()
                            .map(|member| format!("{}.{}", relation.opposite_type, member));
                        Arc::new(AnyRelationEndPointDefinition::TypeNotFound(
                            TypeNotFoundRelationEndPointDefinition::new(&missing_class, property_name),
                        ))
                    }
                };

                let (first, second) = if end_point.is_virtual() && !opposite.is_virtual() {
                    (opposite, end_point.clone())
                } else {
                    (end_point.clone(), opposite)
                };
                let relation_definition = RelationDefinition::create(first, second)?;
                tracing::debug!("Created relation definition '{}'", relation_definition.id());
                result.relation_definitions.add(relation_definition)?;
            }
        }

        for missing_class in type_not_found.into_values() {
            result.type_not_found_classes.add(missing_class)?;
        }

        self.parse_sort_expressions(&result.relation_definitions)?;
        Ok(result)
    }

    /// Relation metadata of the member behind `end_point`
    fn find_relation_attribute(
        &self,
        class_definition: &ClassDefinition,
        end_point: &AnyRelationEndPointDefinition,
    ) -> MappingResult<RelationAttribute> {
        if let Some(declaration) = class_definition.declaration() {
            for member in introduced_members(declaration) {
                let Some(relation) = member.relation.as_ref() else {
                    continue;
                };
                let property_name = self.factory.name_resolver().get_property_name(&member.info)?;
                if end_point.property_name() == Some(property_name.as_str()) {
                    return Ok(relation.clone());
                }
            }
        }

        Err(MappingError::configuration(format!(
            "End point '{}' has no relation property declared on class '{}'.",
            end_point.identity(),
            class_definition.id()
        )))
    }

    /// Look up the declared opposite member on the opposite class and its base classes
    fn find_opposite_end_point(
        &self,
        opposite_class: &Arc<ClassDefinition>,
        relation: &RelationAttribute,
    ) -> MappingResult<OppositeEndPoint> {
        let Some(opposite_member) = relation.opposite_property.as_deref() else {
            return Ok(OppositeEndPoint::Anonymous);
        };

        let hierarchy = std::iter::once(opposite_class.as_ref()).chain(opposite_class.ancestors());
        for class in hierarchy {
            let Some(member) = class
                .declaration()
                .and_then(|declaration| declaration.find_member(opposite_member))
            else {
                continue;
            };
            let property_name = self.factory.name_resolver().get_property_name(&member.info)?;
            if let Some(end_point) = opposite_class.get_relation_end_point_definition(&property_name) {
                return Ok(OppositeEndPoint::Found(end_point));
            }
        }

        Ok(OppositeEndPoint::Missing(format!(
            "{}.{}",
            opposite_class.class_type_name(),
            opposite_member
        )))
    }

    /// Sort expressions refer to properties of the opposite class, so they are
    /// parsed once every relation exists
    fn parse_sort_expressions(&self, relations: &RelationDefinitionCollection) -> MappingResult<()> {
        for relation in relations.iter() {
            for end_point in relation.end_point_definitions() {
                let Some(virtual_end_point) = end_point.as_virtual() else {
                    continue;
                };
                let Some(text) = virtual_end_point.sort_expression_text() else {
                    continue;
                };
                let Some(opposite_class) = relation
                    .get_opposite_of(end_point)
                    .and_then(|opposite| opposite.class_definition())
                    .filter(|class| !class.is_type_not_found())
                else {
                    continue;
                };

                let property_info = virtual_end_point.property_info();
                let sort_expression = SortExpressionDefinitionParser::new(&opposite_class).parse(
                    text,
                    &property_info.declaring_type.full_name,
                    &property_info.name,
                )?;
                virtual_end_point.set_sort_expression(sort_expression)?;
            }
        }
        Ok(())
    }
}

enum OppositeEndPoint {
    Found(Arc<AnyRelationEndPointDefinition>),
    /// Qualified name of the declared but unmapped opposite property
    Missing(String),
    Anonymous,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{MappingObjectFactory, ReflectionBasedMappingObjectFactory};
    use crate::reflection::{ClassDeclaration, PropertyDeclaration, PropertyInfo, PropertyType};

    fn build(declarations: Vec<ClassDeclaration>) -> MappingResult<(ClassDefinitionCollection, RelationDefinitionBuildResult)> {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let declarations: Vec<_> = declarations.into_iter().map(Arc::new).collect();
        let classes = factory.create_class_definition_collection(&declarations)?;
        for class in classes.iter() {
            class.set_property_definitions(factory.create_property_definition_collection(class)?)?;
        }
        for class in classes.iter() {
            class.set_relation_end_point_definitions(factory.create_relation_end_point_definition_collection(class)?)?;
        }
        let result = factory.create_relation_definition_collection(&classes)?;
        Ok((classes, result))
    }

    fn order(sort: Option<&str>) -> ClassDeclaration {
        let order = TypeInfo::new("Shop.Order");
        let items = RelationAttribute::virtual_many("Shop.OrderItem", "Order");
        let items = match sort {
            Some(sort) => items.with_sort_expression(sort),
            None => items,
        };
        ClassDeclaration::new(order.clone()).with_property(PropertyDeclaration::relation(
            PropertyInfo::new("OrderItems", order),
            items,
        ))
    }

    fn order_item() -> ClassDeclaration {
        let item = TypeInfo::new("Shop.OrderItem");
        ClassDeclaration::new(item.clone())
            .with_property(PropertyDeclaration::new(PropertyInfo::new("Position", item.clone()), PropertyType::Int32))
            .with_property(PropertyDeclaration::new(PropertyInfo::new("Product", item.clone()), PropertyType::String))
            .with_property(PropertyDeclaration::relation(
                PropertyInfo::new("Order", item),
                RelationAttribute::foreign_key("Shop.Order", Some("OrderItems")).mandatory(),
            ))
    }

    #[test]
    fn test_bidirectional_relation_created_once() {
        let (classes, result) = build(vec![order(None), order_item()]).unwrap();
        assert_eq!(result.relation_definitions.len(), 1);
        assert!(result.messages.is_empty());

        let relation = result
            .relation_definitions
            .get_mandatory("OrderItem:Shop.OrderItem.Order->Order:Shop.Order.OrderItems")
            .unwrap();
        let items = classes
            .get_mandatory("Order")
            .unwrap()
            .get_mandatory_relation_end_point_definition("Shop.Order.OrderItems")
            .unwrap();
        assert!(Arc::ptr_eq(&items.relation_definition().unwrap(), relation));
        assert!(!relation.first().is_virtual());
    }

    #[test]
    fn test_sort_expression_parsed_against_opposite_class() {
        let (classes, _) = build(vec![order(Some("Product asc, Position desc")), order_item()]).unwrap();
        let items = classes
            .get_mandatory("Order")
            .unwrap()
            .get_mandatory_relation_end_point_definition("Shop.Order.OrderItems")
            .unwrap();
        let sort = items.as_virtual().unwrap().sort_expression().unwrap();
        assert_eq!(
            sort.to_string(),
            "Shop.OrderItem.Product ASC, Shop.OrderItem.Position DESC"
        );
    }

    #[test]
    fn test_malformed_sort_expression_fails_build() {
        let err = build(vec![order(Some("Product asc asc")), order_item()]).unwrap_err();
        assert!(err.to_string().contains("found 3 parts instead"));
        assert!(err.to_string().contains("Declaring type: Shop.Order\nProperty: OrderItems"));
    }

    #[test]
    fn test_unidirectional_relation_gets_anonymous_end() {
        let location = TypeInfo::new("Shop.Location");
        let declarations = vec![
            ClassDeclaration::new(TypeInfo::new("Shop.Client")),
            ClassDeclaration::new(location.clone()).with_property(PropertyDeclaration::relation(
                PropertyInfo::new("Client", location),
                RelationAttribute::foreign_key("Shop.Client", None),
            )),
        ];
        let (_, result) = build(declarations).unwrap();
        let relation = result
            .relation_definitions
            .get_mandatory("Location:Shop.Location.Client")
            .unwrap();
        assert!(relation.second().is_anonymous());
        assert_eq!(relation.second().class_id(), "Client");
    }

    #[test]
    fn test_unknown_type_and_property_yield_sentinels() {
        let item = TypeInfo::new("Shop.OrderItem");
        let declarations = vec![
            ClassDeclaration::new(TypeInfo::new("Shop.Order")),
            ClassDeclaration::new(item.clone())
                .with_property(PropertyDeclaration::relation(
                    PropertyInfo::new("Order", item.clone()),
                    RelationAttribute::foreign_key("Shop.Order", Some("OrderItems")),
                ))
                .with_property(PropertyDeclaration::relation(
                    PropertyInfo::new("Supplier", item),
                    RelationAttribute::foreign_key("Vendor.Supplier", Some("Items")),
                )),
        ];
        let (_, result) = build(declarations).unwrap();
        assert_eq!(result.relation_definitions.len(), 2);

        let missing_property = result
            .relation_definitions
            .get_mandatory("OrderItem:Shop.OrderItem.Order->Order:Shop.Order.OrderItems")
            .unwrap();
        assert!(matches!(
            missing_property.second().as_ref(),
            AnyRelationEndPointDefinition::PropertyNotFound(_)
        ));

        let missing_type = result
            .relation_definitions
            .get_mandatory("OrderItem:Shop.OrderItem.Supplier->Vendor.Supplier:Vendor.Supplier.Items")
            .unwrap();
        assert!(matches!(
            missing_type.second().as_ref(),
            AnyRelationEndPointDefinition::TypeNotFound(_)
        ));
        assert!(result.type_not_found_classes.contains("Vendor.Supplier"));
    }

    #[test]
    fn test_opposite_declared_on_base_class() {
        let company = TypeInfo::new("Shop.Company");
        let order = TypeInfo::new("Shop.Order");
        let declarations = vec![
            ClassDeclaration::new(company.clone()).with_property(PropertyDeclaration::relation(
                PropertyInfo::new("Orders", company),
                RelationAttribute::virtual_many("Shop.Order", "Customer"),
            )),
            ClassDeclaration::new(TypeInfo::new("Shop.Customer")).with_base_type("Shop.Company"),
            ClassDeclaration::new(order.clone()).with_property(PropertyDeclaration::relation(
                PropertyInfo::new("Customer", order),
                RelationAttribute::foreign_key("Shop.Customer", Some("Orders")),
            )),
        ];
        let (_, result) = build(declarations).unwrap();
        assert_eq!(result.relation_definitions.len(), 1);
        assert!(result
            .relation_definitions
            .contains("Order:Shop.Order.Customer->Company:Shop.Company.Orders"));
    }

    #[test]
    fn test_type_not_found_classes_keep_reference_order() {
        let item = TypeInfo::new("Shop.OrderItem");
        let missing = [
            "Vendor.Supplier",
            "Vendor.Carrier",
            "Billing.Ledger",
            "Billing.Account",
            "Stock.Bin",
            "Stock.Shelf",
        ];
        let mut declaration = ClassDeclaration::new(item.clone());
        for (i, type_name) in missing.iter().enumerate() {
            declaration = declaration.with_property(PropertyDeclaration::relation(
                PropertyInfo::new(format!("Reference{}", i), item.clone()),
                RelationAttribute::foreign_key(*type_name, None),
            ));
        }

        let (_, result) = build(vec![declaration]).unwrap();
        let ids: Vec<_> = result
            .type_not_found_classes
            .iter()
            .map(|class| class.id().to_string())
            .collect();
        assert_eq!(ids, missing);
    }
}
