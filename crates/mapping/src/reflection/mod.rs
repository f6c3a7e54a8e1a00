//! Reflection Module - Reflected domain input, name resolution and constraints

pub mod constraints;
pub mod declarations;
pub mod name_resolver;

pub use constraints::*;
pub use declarations::*;
pub use name_resolver::*;
