//! Parser for the sort expressions of collection-valued end points
//!
//! A sort expression is a comma separated list of `<property> [asc|desc]`
//! clauses. Property identifiers are either full qualified property names or
//! member names unique within the class and its base classes.

use std::sync::Arc;

use crate::error::{MappingError, MappingResult};
use crate::model::{
    ClassDefinition, PropertyDefinition, SortExpressionDefinition, SortOrder, SortedPropertySpecification,
};

/// Parses sort expressions against the class the sorted collection contains
pub struct SortExpressionDefinitionParser<'a> {
    class_definition: &'a ClassDefinition,
}

impl<'a> SortExpressionDefinitionParser<'a> {
    pub fn new(class_definition: &'a ClassDefinition) -> Self {
        Self { class_definition }
    }

    /// Parse `text`, declared on `declaring_property` of `declaring_type`
    pub fn parse(
        &self,
        text: &str,
        declaring_type: &str,
        declaring_property: &str,
    ) -> MappingResult<SortExpressionDefinition> {
        let error = |reason: String| {
            MappingError::configuration(format!(
                "SortExpression '{}' cannot be parsed: {}\n\nDeclaring type: {}\nProperty: {}",
                text, reason, declaring_type, declaring_property
            ))
        };

        let mut sorted_properties = Vec::new();
        for clause in text.split(',') {
            let parts: Vec<&str> = clause.split_whitespace().collect();
            let (identifier, order) = match parts.as_slice() {
                [identifier] => (*identifier, SortOrder::Ascending),
                [identifier, order] => (*identifier, Self::parse_order(order).map_err(&error)?),
                _ => {
                    return Err(error(format!(
                        "Expected one or two parts (a property name and an optional identifier), found {} parts instead.",
                        parts.len()
                    )));
                }
            };

            let property_definition = self.resolve_property(identifier).map_err(&error)?;
            sorted_properties.push(SortedPropertySpecification::new(property_definition, order));
        }

        SortExpressionDefinition::new(sorted_properties)
    }

    fn parse_order(word: &str) -> Result<SortOrder, String> {
        if word.eq_ignore_ascii_case("asc") {
            Ok(SortOrder::Ascending)
        } else if word.eq_ignore_ascii_case("desc") {
            Ok(SortOrder::Descending)
        } else {
            Err(format!(
                "'{}' is not a valid sort order. Expected 'asc' or 'desc'.",
                word
            ))
        }
    }

    fn resolve_property(&self, identifier: &str) -> Result<Arc<PropertyDefinition>, String> {
        if let Some(property) = self.find_by_full_name(identifier) {
            return Ok(property);
        }

        let matches: Vec<Arc<PropertyDefinition>> = self
            .class_definition
            .get_property_definitions()
            .into_iter()
            .filter(|property| property.member_name() == identifier)
            .collect();

        match matches.as_slice() {
            [property] => Ok(property.clone()),
            [] => Err(format!(
                "'{}' is not a valid mapped property name. Expected the name of a property declared by the '{}' class or its base classes, or a full unique property identifier.",
                identifier,
                self.class_definition.id()
            )),
            _ => Err(format!(
                "'{}' is ambiguous in class '{}'. Use the full unique property identifier instead.",
                identifier,
                self.class_definition.id()
            )),
        }
    }

    /// Full identifiers may also name properties of derived classes
    fn find_by_full_name(&self, identifier: &str) -> Option<Arc<PropertyDefinition>> {
        if let Some(property) = self.class_definition.get_property_definition(identifier) {
            return Some(property);
        }

        let mut pending = self.class_definition.derived_classes();
        while let Some(derived) = pending.pop() {
            if let Some(property) = derived
                .my_property_definitions()
                .ok()
                .and_then(|properties| properties.get(identifier))
            {
                return Some(property.clone());
            }
            pending.extend(derived.derived_classes());
        }
        None
    }
}
