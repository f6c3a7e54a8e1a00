//! Shared domain fixture for the integration tests
//!
//! Company <- Customer, Company <- Partner (shadows `Name`), Order with items,
//! Official, and the unidirectional Location -> Client relation.

#![allow(dead_code)]

use elif_mapping::{
    ClassDeclaration, MixinDeclaration, PropertyAttribute, PropertyDeclaration, PropertyInfo, PropertyType,
    RelationAttribute, TypeInfo,
};

pub const ORDER_ITEMS_SORT: &str = "Product asc, Position desc";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("elif_mapping=debug")
        .with_test_writer()
        .try_init();
}

fn property(type_name: &str, member: &str, property_type: PropertyType) -> PropertyDeclaration {
    PropertyDeclaration::new(PropertyInfo::new(member, TypeInfo::new(type_name)), property_type)
}

fn relation(type_name: &str, member: &str, attribute: RelationAttribute) -> PropertyDeclaration {
    PropertyDeclaration::relation(PropertyInfo::new(member, TypeInfo::new(type_name)), attribute)
}

fn name(type_name: &str) -> PropertyDeclaration {
    property(type_name, "Name", PropertyType::String).with_attribute(PropertyAttribute::StringProperty {
        is_nullable: false,
        maximum_length: Some(100),
    })
}

pub fn company() -> ClassDeclaration {
    ClassDeclaration::new(TypeInfo::new("Shop.Company"))
        .with_table_name("Companies")
        .with_property(name("Shop.Company"))
}

pub fn customer() -> ClassDeclaration {
    ClassDeclaration::new(TypeInfo::new("Shop.Customer"))
        .with_base_type("Shop.Company")
        .with_property(property("Shop.Customer", "CustomerSince", PropertyType::DateTime).optional())
        .with_property(relation(
            "Shop.Customer",
            "Orders",
            RelationAttribute::virtual_many("Shop.Order", "Customer"),
        ))
}

pub fn partner() -> ClassDeclaration {
    ClassDeclaration::new(TypeInfo::new("Shop.Partner"))
        .with_base_type("Shop.Company")
        .with_property(name("Shop.Partner").with_attribute(PropertyAttribute::DbColumn("PartnerName".to_string())))
}

pub fn order(sort_expression: &str) -> ClassDeclaration {
    ClassDeclaration::new(TypeInfo::new("Shop.Order"))
        .with_property(property("Shop.Order", "Number", PropertyType::Int32))
        .with_property(property("Shop.Order", "DeliveryDate", PropertyType::DateTime))
        .with_property(relation(
            "Shop.Order",
            "Customer",
            RelationAttribute::foreign_key("Shop.Customer", Some("Orders")).mandatory(),
        ))
        .with_property(relation(
            "Shop.Order",
            "Official",
            RelationAttribute::foreign_key("Shop.Official", Some("Orders")),
        ))
        .with_property(relation(
            "Shop.Order",
            "OrderItems",
            RelationAttribute::virtual_many("Shop.OrderItem", "Order").with_sort_expression(sort_expression),
        ))
        .with_mixin(
            MixinDeclaration::persistent(TypeInfo::new("Shop.OrderAuditMixin"))
                .with_property(property("Shop.OrderAuditMixin", "LastAuditor", PropertyType::String)),
        )
}

pub fn order_item() -> ClassDeclaration {
    ClassDeclaration::new(TypeInfo::new("Shop.OrderItem"))
        .with_property(property("Shop.OrderItem", "Position", PropertyType::Int32))
        .with_property(property("Shop.OrderItem", "Product", PropertyType::String).with_attribute(
            PropertyAttribute::StringProperty {
                is_nullable: false,
                maximum_length: Some(100),
            },
        ))
        .with_property(relation(
            "Shop.OrderItem",
            "Order",
            RelationAttribute::foreign_key("Shop.Order", Some("OrderItems")).mandatory(),
        ))
}

pub fn official() -> ClassDeclaration {
    ClassDeclaration::new(TypeInfo::new("Shop.Official"))
        .with_property(name("Shop.Official"))
        .with_property(relation(
            "Shop.Official",
            "Orders",
            RelationAttribute::virtual_many("Shop.Order", "Official"),
        ))
}

pub fn client() -> ClassDeclaration {
    ClassDeclaration::new(TypeInfo::new("Shop.Client")).with_property(name("Shop.Client"))
}

pub fn location() -> ClassDeclaration {
    ClassDeclaration::new(TypeInfo::new("Shop.Location")).with_property(relation(
        "Shop.Location",
        "Client",
        RelationAttribute::foreign_key("Shop.Client", None),
    ))
}

/// The whole shop domain, deliberately not ordered base-first
pub fn shop_domain() -> Vec<ClassDeclaration> {
    vec![
        customer(),
        order(ORDER_ITEMS_SORT),
        company(),
        partner(),
        order_item(),
        official(),
        client(),
        location(),
    ]
}
