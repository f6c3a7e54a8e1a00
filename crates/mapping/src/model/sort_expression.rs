//! Sort expressions of collection-valued end points

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::property_definition::PropertyDefinition;
use crate::error::{MappingError, MappingResult};

/// Direction of one sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A property and the direction it is sorted in
#[derive(Debug, Clone)]
pub struct SortedPropertySpecification {
    property_definition: Arc<PropertyDefinition>,
    order: SortOrder,
}

impl SortedPropertySpecification {
    pub fn new(property_definition: Arc<PropertyDefinition>, order: SortOrder) -> Self {
        Self {
            property_definition,
            order,
        }
    }

    pub fn property_definition(&self) -> &Arc<PropertyDefinition> {
        &self.property_definition
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }
}

impl fmt::Display for SortedPropertySpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property_definition.property_name(), self.order)
    }
}

/// Ordered sort keys, primary key first
#[derive(Debug, Clone)]
pub struct SortExpressionDefinition {
    sorted_properties: Vec<SortedPropertySpecification>,
}

impl SortExpressionDefinition {
    pub fn new(sorted_properties: Vec<SortedPropertySpecification>) -> MappingResult<Self> {
        if sorted_properties.is_empty() {
            return Err(MappingError::configuration(
                "A SortExpressionDefinition must contain at least one sorted property.",
            ));
        }
        Ok(Self { sorted_properties })
    }

    pub fn sorted_properties(&self) -> &[SortedPropertySpecification] {
        &self.sorted_properties
    }
}

impl fmt::Display for SortExpressionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .sorted_properties
            .iter()
            .map(ToString::to_string)
            .collect();
        f.write_str(&parts.join(", "))
    }
}
