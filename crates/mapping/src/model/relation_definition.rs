//! Relation definitions pairing two end points

use std::fmt;
use std::sync::Arc;

use super::end_points::{AnyRelationEndPointDefinition, RelationEndPoint};
use crate::error::{MappingError, MappingResult};

/// A bidirectional relation between two end points.
///
/// Both end points may be the same instance for a reflexive relation.
#[derive(Debug)]
pub struct RelationDefinition {
    id: String,
    end_point_definitions: [Arc<AnyRelationEndPointDefinition>; 2],
}

impl RelationDefinition {
    /// Create a relation; its ID is derived from both end points
    pub fn new(
        first: Arc<AnyRelationEndPointDefinition>,
        second: Arc<AnyRelationEndPointDefinition>,
    ) -> Self {
        let id = Self::relation_id(&first, &second);
        Self {
            id,
            end_point_definitions: [first, second],
        }
    }

    /// Create a relation and back-assign it into both end points
    pub fn create(
        first: Arc<AnyRelationEndPointDefinition>,
        second: Arc<AnyRelationEndPointDefinition>,
    ) -> MappingResult<Arc<Self>> {
        let relation = Arc::new(Self::new(first, second));
        relation.attach()?;
        Ok(relation)
    }

    /// `ClassID:PropertyName->ClassID:PropertyName`; anonymous ends are left out
    pub fn relation_id(first: &AnyRelationEndPointDefinition, second: &AnyRelationEndPointDefinition) -> String {
        [first, second]
            .iter()
            .filter(|end_point| !end_point.is_anonymous())
            .map(|end_point| end_point.identity())
            .collect::<Vec<_>>()
            .join("->")
    }

    /// Assign this relation to its end points; fails if either already belongs to a relation
    pub fn attach(self: &Arc<Self>) -> MappingResult<()> {
        let [first, second] = &self.end_point_definitions;
        first.set_relation_definition(self)?;
        if !Arc::ptr_eq(first, second) {
            second.set_relation_definition(self)?;
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn end_point_definitions(&self) -> &[Arc<AnyRelationEndPointDefinition>; 2] {
        &self.end_point_definitions
    }

    pub fn first(&self) -> &Arc<AnyRelationEndPointDefinition> {
        &self.end_point_definitions[0]
    }

    pub fn second(&self) -> &Arc<AnyRelationEndPointDefinition> {
        &self.end_point_definitions[1]
    }

    fn matches(end_point: &AnyRelationEndPointDefinition, class_id: &str, property_name: Option<&str>) -> bool {
        end_point.class_id() == class_id && end_point.property_name() == property_name
    }

    pub fn get_end_point_definition(
        &self,
        class_id: &str,
        property_name: Option<&str>,
    ) -> Option<&Arc<AnyRelationEndPointDefinition>> {
        self.end_point_definitions
            .iter()
            .find(|end_point| Self::matches(end_point, class_id, property_name))
    }

    /// The end point on the other side of the given one
    pub fn get_opposite_end_point_definition(
        &self,
        class_id: &str,
        property_name: Option<&str>,
    ) -> Option<&Arc<AnyRelationEndPointDefinition>> {
        let [first, second] = &self.end_point_definitions;
        if Self::matches(first, class_id, property_name) {
            Some(second)
        } else if Self::matches(second, class_id, property_name) {
            Some(first)
        } else {
            None
        }
    }

    pub fn get_mandatory_opposite_end_point_definition(
        &self,
        class_id: &str,
        property_name: Option<&str>,
    ) -> MappingResult<&Arc<AnyRelationEndPointDefinition>> {
        self.get_opposite_end_point_definition(class_id, property_name)
            .ok_or_else(|| {
                MappingError::not_found(format!(
                    "Relation '{}' has no end point for class '{}' and property '{}'.",
                    self.id,
                    class_id,
                    property_name.unwrap_or("<anonymous>")
                ))
            })
    }

    /// The end point opposite to `end_point`, compared by identity
    pub fn get_opposite_of(
        &self,
        end_point: &Arc<AnyRelationEndPointDefinition>,
    ) -> Option<&Arc<AnyRelationEndPointDefinition>> {
        let [first, second] = &self.end_point_definitions;
        if Arc::ptr_eq(first, end_point) {
            Some(second)
        } else if Arc::ptr_eq(second, end_point) {
            Some(first)
        } else {
            None
        }
    }

    pub fn is_end_point(&self, class_id: &str, property_name: Option<&str>) -> bool {
        self.get_end_point_definition(class_id, property_name).is_some()
    }

    /// Both ends are the same end point
    pub fn is_reflexive(&self) -> bool {
        Arc::ptr_eq(&self.end_point_definitions[0], &self.end_point_definitions[1])
    }
}

impl fmt::Display for RelationDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
