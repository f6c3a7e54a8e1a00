//! Validation of the finished mapping graph
//!
//! Rules run over every relation and collect their messages, so a broken
//! domain model reports all of its problems in one error.

use std::sync::Arc;

use crate::error::{MappingError, MappingResult};
use crate::model::{
    AnyRelationEndPointDefinition, ClassDefinition, RelationDefinition, RelationDefinitionCollection,
    RelationEndPoint,
};
use crate::reflection::RelationAttribute;

/// Messages produced by a validation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "validation reports should be checked with `is_valid` or `into_result`"]
pub struct MappingValidationReport {
    messages: Vec<String>,
}

impl MappingValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Append messages recorded elsewhere, such as during relation assembly
    pub fn with_messages(mut self, messages: impl IntoIterator<Item = String>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_result(self) -> MappingResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(MappingError::Validation(self.messages))
        }
    }
}

/// Runs the relation rules over a set of relation definitions
pub struct MappingValidator<'a> {
    relation_definitions: &'a RelationDefinitionCollection,
}

impl<'a> MappingValidator<'a> {
    pub fn new(relation_definitions: &'a RelationDefinitionCollection) -> Self {
        Self {
            relation_definitions,
        }
    }

    pub fn validate(&self) -> MappingValidationReport {
        let mut report = MappingValidationReport::new();
        for relation in self.relation_definitions.iter() {
            Self::check_invalid_end_points(relation, &mut report);
            Self::check_virtuality(relation, &mut report);
            Self::check_bidirectional_declarations(relation, &mut report);
        }

        if !report.is_valid() {
            tracing::debug!("Mapping validation found {} problems", report.messages().len());
        }
        report
    }

    fn check_invalid_end_points(relation: &RelationDefinition, report: &mut MappingValidationReport) {
        for end_point in relation.end_point_definitions() {
            let Some(referencing) = relation.get_opposite_of(end_point) else {
                continue;
            };
            let referencing_name = referencing.property_name().unwrap_or("<anonymous>");

            match end_point.as_ref() {
                AnyRelationEndPointDefinition::TypeNotFound(_) => report.add_message(format!(
                    "The relation property '{}' on class '{}' refers to type '{}', which is not part of the mapping.",
                    referencing_name,
                    referencing.class_id(),
                    end_point.class_id()
                )),
                AnyRelationEndPointDefinition::PropertyNotFound(_) => report.add_message(format!(
                    "The relation property '{}' on class '{}' declares the opposite property '{}', which is not a relation property of class '{}'.",
                    referencing_name,
                    referencing.class_id(),
                    end_point.property_name().unwrap_or_default(),
                    end_point.class_id()
                )),
                _ => {}
            }
        }
    }

    fn check_virtuality(relation: &RelationDefinition, report: &mut MappingValidationReport) {
        let [first, second] = relation.end_point_definitions();
        if first.is_invalid() || second.is_invalid() {
            return;
        }

        if first.is_virtual() && second.is_virtual() {
            report.add_message(format!(
                "Relation '{}' has two virtual end points. One side must contain the foreign key.",
                relation.id()
            ));
        } else if !first.is_virtual() && !second.is_virtual() && !relation.is_reflexive() {
            report.add_message(format!(
                "Relation '{}' has two non-virtual end points. Only one side may contain the foreign key.",
                relation.id()
            ));
        }
    }

    /// Both named ends must declare each other as opposite
    fn check_bidirectional_declarations(relation: &RelationDefinition, report: &mut MappingValidationReport) {
        if relation.is_reflexive() {
            return;
        }
        let [first, second] = relation.end_point_definitions();
        let (Some(first_attribute), Some(second_attribute)) =
            (Self::relation_attribute(first), Self::relation_attribute(second))
        else {
            return;
        };

        for (end_point, attribute, opposite) in [
            (first, &first_attribute, second),
            (second, &second_attribute, first),
        ] {
            let opposite_member = opposite.property_info().map(|info| info.name.as_str());
            if attribute.opposite_property.as_deref() != opposite_member {
                report.add_message(format!(
                    "Relation property '{}' on class '{}' declares '{}' as its opposite property, but is paired with '{}'.",
                    end_point.property_name().unwrap_or_default(),
                    end_point.class_id(),
                    attribute.opposite_property.as_deref().unwrap_or("<none>"),
                    opposite.property_name().unwrap_or("<anonymous>")
                ));
            }
        }
    }

    fn relation_attribute(end_point: &Arc<AnyRelationEndPointDefinition>) -> Option<RelationAttribute> {
        let info = end_point.property_info()?;
        let class: Arc<ClassDefinition> = end_point.class_definition()?;
        let declaration = class.declaration()?;
        let relation = declaration
            .mapped_members()
            .find(|member| member.info.id() == info.id())
            .and_then(|member| member.relation.clone());
        relation
    }
}
