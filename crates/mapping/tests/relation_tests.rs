mod common;

use std::sync::Arc;

use common::{init_tracing, order, shop_domain};
use elif_mapping::{
    CardinalityType, ClassDeclaration, MappingConfig, MappingError, MappingLoader, MixinConfiguration,
    PropertyDeclaration, PropertyInfo, PropertyType, RelationAttribute, RelationEndPoint, TypeInfo,
};

fn load(declarations: &[ClassDeclaration], config: MappingConfig) -> Result<elif_mapping::MappingConfiguration, MappingError> {
    init_tracing();
    MappingLoader::new(config).load(declarations, &MixinConfiguration::from_declarations(declarations))
}

fn invoice() -> ClassDeclaration {
    let invoice = TypeInfo::new("Shop.Invoice");
    ClassDeclaration::new(invoice.clone())
        .with_property(PropertyDeclaration::relation(
            PropertyInfo::new("Ledger", invoice.clone()),
            RelationAttribute::foreign_key("Shop.Ledger", Some("Invoices")),
        ))
        .with_property(PropertyDeclaration::relation(
            PropertyInfo::new("Customer", invoice),
            RelationAttribute::foreign_key("Shop.Customer", Some("Invoices")),
        ))
}

#[test]
fn test_relation_ids() {
    let mapping = load(&shop_domain(), MappingConfig::testing()).unwrap();

    let mut ids: Vec<_> = mapping
        .relation_definitions()
        .iter()
        .map(|relation| relation.id().to_string())
        .collect();
    ids.sort();
    assert_eq!(
        ids,
        vec![
            "Location:Shop.Location.Client",
            "Order:Shop.Order.Customer->Customer:Shop.Customer.Orders",
            "Order:Shop.Order.Official->Official:Shop.Official.Orders",
            "OrderItem:Shop.OrderItem.Order->Order:Shop.Order.OrderItems",
        ]
    );
}

#[test]
fn test_every_end_point_belongs_to_exactly_one_relation() {
    let mapping = load(&shop_domain(), MappingConfig::testing()).unwrap();

    for class in mapping.class_definitions().iter() {
        for end_point in class.my_relation_end_point_definitions().unwrap().iter() {
            let relation = end_point
                .relation_definition()
                .unwrap_or_else(|| panic!("{} has no relation", end_point.identity()));
            let matching = relation
                .end_point_definitions()
                .iter()
                .filter(|candidate| Arc::ptr_eq(candidate, end_point))
                .count();
            assert_eq!(matching, 1, "{}", relation.id());
        }
    }
}

#[test]
fn test_opposite_end_points() {
    let mapping = load(&shop_domain(), MappingConfig::testing()).unwrap();

    let relation = mapping
        .get_mandatory_relation_definition("Order:Shop.Order.Customer->Customer:Shop.Customer.Orders")
        .unwrap();
    let opposite = relation
        .get_mandatory_opposite_end_point_definition("Order", Some("Shop.Order.Customer"))
        .unwrap();
    assert_eq!(opposite.class_id(), "Customer");
    assert_eq!(opposite.property_name(), Some("Shop.Customer.Orders"));
    assert_eq!(opposite.cardinality(), CardinalityType::Many);
    assert!(opposite.is_virtual());

    let foreign_key = relation.first();
    assert!(!foreign_key.is_virtual());
    assert!(foreign_key.is_mandatory());
    assert_eq!(foreign_key.cardinality(), CardinalityType::One);
}

#[test]
fn test_unidirectional_relation_has_anonymous_end() {
    let mapping = load(&shop_domain(), MappingConfig::testing()).unwrap();

    let relation = mapping
        .get_mandatory_relation_definition("Location:Shop.Location.Client")
        .unwrap();
    let anonymous = relation.second();
    assert!(anonymous.is_anonymous());
    assert!(anonymous.is_virtual());
    assert_eq!(anonymous.class_id(), "Client");
    assert_eq!(anonymous.property_name(), None);

    let client = mapping.get_mandatory_class_definition("Client").unwrap();
    assert!(client.my_relation_end_point_definitions().unwrap().is_empty());
}

#[test]
fn test_sort_expression_is_resolved_against_opposite_class() {
    let mapping = load(&shop_domain(), MappingConfig::testing()).unwrap();

    let items = mapping
        .get_mandatory_relation_end_point_definition("Shop.Order.OrderItems")
        .unwrap();
    let sort_expression = items.as_virtual().unwrap().sort_expression().unwrap();
    assert_eq!(
        sort_expression.to_string(),
        "Shop.OrderItem.Product ASC, Shop.OrderItem.Position DESC"
    );
    for sorted in sort_expression.sorted_properties() {
        assert_eq!(sorted.property_definition().class_id(), "OrderItem");
    }

    let orders = mapping
        .get_mandatory_relation_end_point_definition("Shop.Customer.Orders")
        .unwrap();
    assert!(orders.as_virtual().unwrap().sort_expression().is_none());
}

#[test]
fn test_malformed_sort_expression_fails_the_load() {
    let mut declarations = shop_domain();
    declarations[1] = order("Product asc asc");

    let err = load(&declarations, MappingConfig::testing()).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "SortExpression 'Product asc asc' cannot be parsed: Expected one or two parts (a property name and an optional identifier), found 3 parts instead.\n\nDeclaring type: Shop.Order\nProperty: OrderItems"
    );
}

#[test]
fn test_sort_expression_on_foreign_key_fails_the_load() {
    let item = TypeInfo::new("Shop.OrderItem");
    let mut declarations = shop_domain();
    declarations[4] = ClassDeclaration::new(item.clone())
        .with_property(PropertyDeclaration::new(PropertyInfo::new("Position", item.clone()), PropertyType::Int32))
        .with_property(PropertyDeclaration::relation(
            PropertyInfo::new("Order", item),
            RelationAttribute::foreign_key("Shop.Order", Some("OrderItems"))
                .mandatory()
                .with_sort_expression("Position asc"),
        ));

    let err = load(&declarations, MappingConfig::testing()).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "Property 'Shop.OrderItem.Order' of class 'OrderItem' has a sort expression, but only relation end points with cardinality 'Many' can have one."
    );
}

#[test]
fn test_validation_collects_every_problem() {
    let mut declarations = shop_domain();
    declarations.push(invoice());

    let err = load(&declarations, MappingConfig::testing()).unwrap_err();
    let MappingError::Validation(messages) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(
        messages,
        vec![
            "The relation property 'Shop.Invoice.Ledger' on class 'Invoice' refers to type 'Shop.Ledger', which is not part of the mapping.".to_string(),
            "The relation property 'Shop.Invoice.Customer' on class 'Invoice' declares the opposite property 'Shop.Customer.Invoices', which is not a relation property of class 'Customer'.".to_string(),
        ]
    );
}

#[test]
fn test_disabled_validation_keeps_type_not_found_classes() {
    let mut declarations = shop_domain();
    declarations.push(invoice());

    let mapping = load(&declarations, MappingConfig::testing().with_validation(false)).unwrap();

    let ledger = mapping.type_not_found_classes().get_mandatory("Shop.Ledger").unwrap();
    assert!(ledger.is_type_not_found());
    assert!(ledger.get_property_definitions().is_empty());
    assert!(mapping.get_class_definition("Shop.Ledger").is_none());

    let relation = mapping
        .get_mandatory_relation_end_point_definition("Shop.Invoice.Ledger")
        .unwrap()
        .relation_definition()
        .unwrap();
    assert!(relation.second().is_invalid());
    assert_eq!(relation.second().property_name(), Some("Shop.Ledger.Invoices"));
}

#[test]
fn test_opposite_declared_twice_is_reported() {
    let archive = TypeInfo::new("Shop.OrderArchive");
    let mut declarations = shop_domain();
    declarations.push(ClassDeclaration::new(archive.clone()).with_property(PropertyDeclaration::relation(
        PropertyInfo::new("Customer", archive),
        RelationAttribute::foreign_key("Shop.Customer", Some("Orders")),
    )));

    let err = load(&declarations, MappingConfig::testing()).unwrap_err();
    let MappingError::Validation(messages) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with(
        "Relation property 'Shop.OrderArchive.Customer' on class 'OrderArchive' declares"
    ));
    assert!(messages[0].contains("already belongs to relation"));
}
