//! Mapping configuration
//!
//! Controls which storage provider a class hierarchy is assigned to and which
//! validation passes run while the mapping is loaded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

pub const ENV_DEFAULT_PROVIDER: &str = "ELIF_MAPPING_DEFAULT_PROVIDER";
pub const ENV_STORAGE_GROUPS: &str = "ELIF_MAPPING_STORAGE_GROUPS";
pub const ENV_VALIDATE: &str = "ELIF_MAPPING_VALIDATE";
pub const ENV_VALIDATE_MIXINS: &str = "ELIF_MAPPING_VALIDATE_MIXINS";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired { field: String, hint: String },

    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Configuration validation failed: {message}")]
    ValidationFailed { message: String },
}

impl ConfigError {
    /// Create a missing required field error
    pub fn missing_required(field: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
            hint: hint.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create a validation failed error
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

/// Mapping loader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Provider used for hierarchies without a storage group assignment
    pub default_storage_provider: String,
    /// Storage group type name -> provider name
    pub storage_group_providers: HashMap<String, String>,
    /// Run the accumulating mapping validator while loading
    pub validate_mapping: bool,
    /// Check every class against the active mixin configuration while loading
    pub validate_mixins_on_load: bool,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            default_storage_provider: "Default".to_string(),
            storage_group_providers: HashMap::new(),
            validate_mapping: true,
            validate_mixins_on_load: false,
        }
    }
}

impl MappingConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for tests: everything validated eagerly
    pub fn testing() -> Self {
        Self {
            validate_mixins_on_load: true,
            ..Self::default()
        }
    }

    pub fn with_default_storage_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_storage_provider = provider.into();
        self
    }

    pub fn with_storage_group(
        mut self,
        storage_group: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        self.storage_group_providers
            .insert(storage_group.into(), provider.into());
        self
    }

    pub fn with_validation(mut self, validate_mapping: bool) -> Self {
        self.validate_mapping = validate_mapping;
        self
    }

    pub fn with_mixin_validation(mut self, validate_mixins_on_load: bool) -> Self {
        self.validate_mixins_on_load = validate_mixins_on_load;
        self
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(provider) = env::var(ENV_DEFAULT_PROVIDER) {
            config.default_storage_provider = provider;
        }

        if let Ok(groups) = env::var(ENV_STORAGE_GROUPS) {
            config.storage_group_providers = parse_storage_groups(&groups)?;
        }

        if let Ok(value) = env::var(ENV_VALIDATE) {
            config.validate_mapping = parse_bool(ENV_VALIDATE, &value)?;
        }

        if let Ok(value) = env::var(ENV_VALIDATE_MIXINS) {
            config.validate_mixins_on_load = parse_bool(ENV_VALIDATE_MIXINS, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_storage_provider.trim().is_empty() {
            return Err(ConfigError::missing_required(
                "default_storage_provider",
                format!("Set {} to the name of a storage provider", ENV_DEFAULT_PROVIDER),
            ));
        }

        for (group, provider) in &self.storage_group_providers {
            if group.trim().is_empty() || provider.trim().is_empty() {
                return Err(ConfigError::validation_failed(format!(
                    "Storage group assignment '{}={}' must name both a group and a provider",
                    group, provider
                )));
            }
        }

        Ok(())
    }

    /// Provider name for a storage group, or the default provider
    pub fn provider_for_storage_group(&self, storage_group: Option<&str>) -> &str {
        storage_group
            .and_then(|group| self.storage_group_providers.get(group))
            .map(String::as_str)
            .unwrap_or(&self.default_storage_provider)
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_value(field, value, "true or false")),
    }
}

fn parse_storage_groups(value: &str) -> Result<HashMap<String, String>, ConfigError> {
    let mut groups = HashMap::new();
    for assignment in value.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((group, provider)) = assignment.split_once('=') else {
            return Err(ConfigError::invalid_value(
                ENV_STORAGE_GROUPS,
                assignment,
                "Group=Provider pairs separated by ';'",
            ));
        };
        groups.insert(group.trim().to_string(), provider.trim().to_string());
    }
    Ok(groups)
}
