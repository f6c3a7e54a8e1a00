//! Builder Module - Turns reflected declarations into the mapping graph
//!
//! [`MappingObjectFactory`] creates single definitions; the collection
//! factories drive it over classes, properties, end points and relations.

pub mod class_collection;
pub mod end_point_collection;
pub mod object_factory;
pub mod property_collection;
pub mod relation_collection;
pub mod sort_expression_parser;

pub use class_collection::ClassDefinitionCollectionFactory;
pub use end_point_collection::RelationEndPointDefinitionCollectionFactory;
pub use object_factory::{MappingObjectFactory, ReflectionBasedMappingObjectFactory};
pub use property_collection::{introduced_members, mapped_properties, PropertyDefinitionCollectionFactory};
pub use relation_collection::{RelationDefinitionBuildResult, RelationDefinitionCollectionFactory};
pub use sort_expression_parser::SortExpressionDefinitionParser;
