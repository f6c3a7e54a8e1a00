//! Model Module - Class, property, end point and relation definitions

pub mod class_definition;
pub mod collections;
pub mod end_points;
pub mod property_definition;
pub mod relation_definition;
pub mod sort_expression;
pub mod storage;

pub use class_definition::*;
pub use collections::*;
pub use end_points::*;
pub use property_definition::*;
pub use relation_definition::*;
pub use sort_expression::*;
pub use storage::*;
