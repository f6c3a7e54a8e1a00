//! Mixins Module - Mixin configuration snapshots and drift detection

pub mod configuration;
pub mod validator;

pub use configuration::*;
pub use validator::*;
