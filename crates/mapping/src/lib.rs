//! # elif-mapping: Mapping Metadata Engine for elif.rs
//!
//! Builds the read-only mapping graph a persistence engine works from:
//! class definitions with their inheritance hierarchy, property definitions,
//! relation end points paired into relation definitions, sort expressions of
//! collection properties and storage entities per class.
//!
//! The input is a set of reflected [`ClassDeclaration`]s. [`MappingLoader`]
//! runs the build pipeline and returns a sealed [`MappingConfiguration`] that
//! can be shared across threads.
//!
//! ```no_run
//! use elif_mapping::{MappingConfig, MappingLoader, MixinConfiguration};
//!
//! # fn main() -> elif_mapping::MappingResult<()> {
//! let json = std::fs::read_to_string("mapping.json").unwrap_or_default();
//! let mapping = MappingLoader::new(MappingConfig::from_env()?)
//!     .load_from_json(&json, &MixinConfiguration::new())?;
//! let order = mapping.get_mandatory_class_definition("Order")?;
//! # let _ = order;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod loader;
pub mod mixins;
pub mod model;
pub mod persistence;
pub mod reflection;
pub mod validation;
pub mod write_once;

// Re-export core types
pub use builder::*;
pub use config::*;
pub use error::*;
pub use loader::*;
pub use mixins::*;
pub use model::*;
pub use persistence::*;
pub use reflection::*;
pub use validation::*;
pub use write_once::WriteOnce;
