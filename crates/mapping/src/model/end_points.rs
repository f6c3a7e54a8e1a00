//! Relation end point definitions
//!
//! Every end point variant implements [`RelationEndPoint`]. The builders pick
//! the variant from the shape of the declaration: a stored foreign key gives a
//! real end point, no stored column a virtual one, no declared opposite an
//! anonymous one, and unresolvable references one of the invalid sentinels.

use std::fmt;
use std::sync::{Arc, Weak};

use super::class_definition::ClassDefinition;
use super::property_definition::PropertyDefinition;
use super::relation_definition::RelationDefinition;
use super::sort_expression::SortExpressionDefinition;
use crate::error::{MappingError, MappingResult};
use crate::reflection::{CardinalityType, PropertyInfo, PropertyType};
use crate::write_once::WriteOnce;

/// Capabilities shared by all end point variants
pub trait RelationEndPoint {
    fn class_id(&self) -> &str;

    fn class_definition(&self) -> Option<Arc<ClassDefinition>>;

    /// Qualified property name; `None` for anonymous end points
    fn property_name(&self) -> Option<&str>;

    fn property_type(&self) -> Option<&PropertyType>;

    fn is_virtual(&self) -> bool;

    fn is_anonymous(&self) -> bool;

    fn is_mandatory(&self) -> bool;

    fn cardinality(&self) -> CardinalityType;

    fn relation_definition(&self) -> Option<Arc<RelationDefinition>>;

    /// Back-link to the owning relation; may be assigned once
    fn set_relation_definition(&self, relation: &Arc<RelationDefinition>) -> MappingResult<()>;
}

/// Class link and relation back-link common to every end point
#[derive(Debug)]
struct EndPointOwner {
    class_id: String,
    class_definition: Weak<ClassDefinition>,
    relation_definition: WriteOnce<Weak<RelationDefinition>>,
}

impl EndPointOwner {
    fn new(class_definition: &Arc<ClassDefinition>) -> Self {
        Self {
            class_id: class_definition.id().to_string(),
            class_definition: Arc::downgrade(class_definition),
            relation_definition: WriteOnce::new(),
        }
    }

    fn relation_definition(&self) -> Option<Arc<RelationDefinition>> {
        self.relation_definition.get().and_then(Weak::upgrade)
    }

    fn set_relation_definition(
        &self,
        relation: &Arc<RelationDefinition>,
        property_name: Option<&str>,
    ) -> MappingResult<()> {
        self.relation_definition.set(Arc::downgrade(relation), || {
            format!(
                "RelationDefinition has already been set for end point '{}:{}'.",
                self.class_id,
                property_name.unwrap_or("<anonymous>")
            )
        })
    }
}

/// Non-virtual end point backed by a stored object reference
#[derive(Debug)]
pub struct RelationEndPointDefinition {
    owner: EndPointOwner,
    property_definition: Arc<PropertyDefinition>,
    is_mandatory: bool,
}

impl RelationEndPointDefinition {
    pub fn new(
        class_definition: &Arc<ClassDefinition>,
        property_definition: Arc<PropertyDefinition>,
        is_mandatory: bool,
    ) -> MappingResult<Self> {
        if !property_definition.is_object_id() {
            return Err(MappingError::configuration(format!(
                "Relation property '{}' on class '{}' is of type '{}', but non-virtual relation properties must be of type '{}'.",
                property_definition.member_name(),
                class_definition.id(),
                property_definition.property_type(),
                PropertyType::ObjectId
            )));
        }

        Ok(Self {
            owner: EndPointOwner::new(class_definition),
            property_definition,
            is_mandatory,
        })
    }

    pub fn property_definition(&self) -> &Arc<PropertyDefinition> {
        &self.property_definition
    }
}

impl RelationEndPoint for RelationEndPointDefinition {
    fn class_id(&self) -> &str {
        &self.owner.class_id
    }

    fn class_definition(&self) -> Option<Arc<ClassDefinition>> {
        self.owner.class_definition.upgrade()
    }

    fn property_name(&self) -> Option<&str> {
        Some(self.property_definition.property_name())
    }

    fn property_type(&self) -> Option<&PropertyType> {
        Some(self.property_definition.property_type())
    }

    fn is_virtual(&self) -> bool {
        false
    }

    fn is_anonymous(&self) -> bool {
        false
    }

    fn is_mandatory(&self) -> bool {
        self.is_mandatory
    }

    fn cardinality(&self) -> CardinalityType {
        CardinalityType::One
    }

    fn relation_definition(&self) -> Option<Arc<RelationDefinition>> {
        self.owner.relation_definition()
    }

    fn set_relation_definition(&self, relation: &Arc<RelationDefinition>) -> MappingResult<()> {
        self.owner
            .set_relation_definition(relation, self.property_name())
    }
}

/// End point without a stored column, usually the collection side
#[derive(Debug)]
pub struct VirtualRelationEndPointDefinition {
    owner: EndPointOwner,
    property_name: String,
    property_info: PropertyInfo,
    is_mandatory: bool,
    cardinality: CardinalityType,
    property_type: PropertyType,
    sort_expression_text: Option<String>,
    sort_expression: WriteOnce<SortExpressionDefinition>,
}

impl VirtualRelationEndPointDefinition {
    pub fn new(
        class_definition: &Arc<ClassDefinition>,
        property_name: impl Into<String>,
        property_info: PropertyInfo,
        is_mandatory: bool,
        cardinality: CardinalityType,
        property_type: PropertyType,
        sort_expression_text: Option<String>,
    ) -> MappingResult<Self> {
        let property_name = property_name.into();
        if sort_expression_text.is_some() && cardinality == CardinalityType::One {
            return Err(MappingError::configuration(format!(
                "Property '{}' of class '{}' has a sort expression, but only relation end points with cardinality 'Many' can have one.",
                property_name,
                class_definition.id()
            )));
        }

        Ok(Self {
            owner: EndPointOwner::new(class_definition),
            property_name,
            property_info,
            is_mandatory,
            cardinality,
            property_type,
            sort_expression_text,
            sort_expression: WriteOnce::new(),
        })
    }

    pub fn property_info(&self) -> &PropertyInfo {
        &self.property_info
    }

    pub fn sort_expression_text(&self) -> Option<&str> {
        self.sort_expression_text.as_deref()
    }

    /// Parsed sort expression, available once the relation graph has been assembled
    pub fn sort_expression(&self) -> Option<&SortExpressionDefinition> {
        self.sort_expression.get()
    }

    pub fn set_sort_expression(&self, sort_expression: SortExpressionDefinition) -> MappingResult<()> {
        self.sort_expression.set(sort_expression, || {
            format!(
                "Sort expression has already been set for end point '{}:{}'.",
                self.owner.class_id, self.property_name
            )
        })
    }
}

impl RelationEndPoint for VirtualRelationEndPointDefinition {
    fn class_id(&self) -> &str {
        &self.owner.class_id
    }

    fn class_definition(&self) -> Option<Arc<ClassDefinition>> {
        self.owner.class_definition.upgrade()
    }

    fn property_name(&self) -> Option<&str> {
        Some(&self.property_name)
    }

    fn property_type(&self) -> Option<&PropertyType> {
        Some(&self.property_type)
    }

    fn is_virtual(&self) -> bool {
        true
    }

    fn is_anonymous(&self) -> bool {
        false
    }

    fn is_mandatory(&self) -> bool {
        self.is_mandatory
    }

    fn cardinality(&self) -> CardinalityType {
        self.cardinality
    }

    fn relation_definition(&self) -> Option<Arc<RelationDefinition>> {
        self.owner.relation_definition()
    }

    fn set_relation_definition(&self, relation: &Arc<RelationDefinition>) -> MappingResult<()> {
        self.owner
            .set_relation_definition(relation, Some(&self.property_name))
    }
}

/// Opposite side of a unidirectional relation: no property is declared there
#[derive(Debug)]
pub struct AnonymousRelationEndPointDefinition {
    owner: EndPointOwner,
}

impl AnonymousRelationEndPointDefinition {
    pub fn new(class_definition: &Arc<ClassDefinition>) -> Self {
        Self {
            owner: EndPointOwner::new(class_definition),
        }
    }
}

impl RelationEndPoint for AnonymousRelationEndPointDefinition {
    fn class_id(&self) -> &str {
        &self.owner.class_id
    }

    fn class_definition(&self) -> Option<Arc<ClassDefinition>> {
        self.owner.class_definition.upgrade()
    }

    fn property_name(&self) -> Option<&str> {
        None
    }

    fn property_type(&self) -> Option<&PropertyType> {
        None
    }

    fn is_virtual(&self) -> bool {
        true
    }

    fn is_anonymous(&self) -> bool {
        true
    }

    fn is_mandatory(&self) -> bool {
        false
    }

    fn cardinality(&self) -> CardinalityType {
        CardinalityType::Many
    }

    fn relation_definition(&self) -> Option<Arc<RelationDefinition>> {
        self.owner.relation_definition()
    }

    fn set_relation_definition(&self, relation: &Arc<RelationDefinition>) -> MappingResult<()> {
        self.owner.set_relation_definition(relation, None)
    }
}

/// Shared state of the sentinels standing in for unresolvable end points
#[derive(Debug)]
pub struct InvalidRelationEndPointDefinitionBase {
    owner: EndPointOwner,
    property_name: Option<String>,
}

impl InvalidRelationEndPointDefinitionBase {
    fn new(class_definition: &Arc<ClassDefinition>, property_name: Option<String>) -> Self {
        Self {
            owner: EndPointOwner::new(class_definition),
            property_name,
        }
    }
}

impl RelationEndPoint for InvalidRelationEndPointDefinitionBase {
    fn class_id(&self) -> &str {
        &self.owner.class_id
    }

    fn class_definition(&self) -> Option<Arc<ClassDefinition>> {
        self.owner.class_definition.upgrade()
    }

    fn property_name(&self) -> Option<&str> {
        self.property_name.as_deref()
    }

    fn property_type(&self) -> Option<&PropertyType> {
        None
    }

    fn is_virtual(&self) -> bool {
        false
    }

    fn is_anonymous(&self) -> bool {
        false
    }

    fn is_mandatory(&self) -> bool {
        false
    }

    fn cardinality(&self) -> CardinalityType {
        CardinalityType::One
    }

    fn relation_definition(&self) -> Option<Arc<RelationDefinition>> {
        self.owner.relation_definition()
    }

    fn set_relation_definition(&self, relation: &Arc<RelationDefinition>) -> MappingResult<()> {
        self.owner
            .set_relation_definition(relation, self.property_name.as_deref())
    }
}

/// A declared opposite property that does not exist on the opposite class
#[derive(Debug)]
pub struct PropertyNotFoundRelationEndPointDefinition(InvalidRelationEndPointDefinitionBase);

impl PropertyNotFoundRelationEndPointDefinition {
    pub fn new(class_definition: &Arc<ClassDefinition>, property_name: impl Into<String>) -> Self {
        Self(InvalidRelationEndPointDefinitionBase::new(
            class_definition,
            Some(property_name.into()),
        ))
    }
}

/// An end point on a class whose type is not part of the mapping
#[derive(Debug)]
pub struct TypeNotFoundRelationEndPointDefinition(InvalidRelationEndPointDefinitionBase);

impl TypeNotFoundRelationEndPointDefinition {
    pub fn new(class_definition: &Arc<ClassDefinition>, property_name: Option<String>) -> Self {
        Self(InvalidRelationEndPointDefinitionBase::new(
            class_definition,
            property_name,
        ))
    }
}

impl std::ops::Deref for PropertyNotFoundRelationEndPointDefinition {
    type Target = InvalidRelationEndPointDefinitionBase;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::Deref for TypeNotFoundRelationEndPointDefinition {
    type Target = InvalidRelationEndPointDefinitionBase;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Any end point variant
#[derive(Debug)]
pub enum AnyRelationEndPointDefinition {
    Real(RelationEndPointDefinition),
    Virtual(VirtualRelationEndPointDefinition),
    Anonymous(AnonymousRelationEndPointDefinition),
    PropertyNotFound(PropertyNotFoundRelationEndPointDefinition),
    TypeNotFound(TypeNotFoundRelationEndPointDefinition),
}

impl AnyRelationEndPointDefinition {
    pub fn as_end_point(&self) -> &dyn RelationEndPoint {
        match self {
            Self::Real(end_point) => end_point,
            Self::Virtual(end_point) => end_point,
            Self::Anonymous(end_point) => end_point,
            Self::PropertyNotFound(end_point) => &end_point.0,
            Self::TypeNotFound(end_point) => &end_point.0,
        }
    }

    pub fn as_real(&self) -> Option<&RelationEndPointDefinition> {
        match self {
            Self::Real(end_point) => Some(end_point),
            _ => None,
        }
    }

    pub fn as_virtual(&self) -> Option<&VirtualRelationEndPointDefinition> {
        match self {
            Self::Virtual(end_point) => Some(end_point),
            _ => None,
        }
    }

    /// Sentinels produced for unresolvable references
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::PropertyNotFound(_) | Self::TypeNotFound(_))
    }

    /// Declared member behind the end point, if there is one
    pub fn property_info(&self) -> Option<&PropertyInfo> {
        match self {
            Self::Real(end_point) => Some(end_point.property_definition().property_info()),
            Self::Virtual(end_point) => Some(end_point.property_info()),
            _ => None,
        }
    }

    /// `ClassID:PropertyName`, as used in relation IDs
    pub fn identity(&self) -> String {
        format!(
            "{}:{}",
            self.class_id(),
            self.property_name().unwrap_or("<anonymous>")
        )
    }
}

impl RelationEndPoint for AnyRelationEndPointDefinition {
    fn class_id(&self) -> &str {
        self.as_end_point().class_id()
    }

    fn class_definition(&self) -> Option<Arc<ClassDefinition>> {
        self.as_end_point().class_definition()
    }

    fn property_name(&self) -> Option<&str> {
        self.as_end_point().property_name()
    }

    fn property_type(&self) -> Option<&PropertyType> {
        self.as_end_point().property_type()
    }

    fn is_virtual(&self) -> bool {
        self.as_end_point().is_virtual()
    }

    fn is_anonymous(&self) -> bool {
        self.as_end_point().is_anonymous()
    }

    fn is_mandatory(&self) -> bool {
        self.as_end_point().is_mandatory()
    }

    fn cardinality(&self) -> CardinalityType {
        self.as_end_point().cardinality()
    }

    fn relation_definition(&self) -> Option<Arc<RelationDefinition>> {
        self.as_end_point().relation_definition()
    }

    fn set_relation_definition(&self, relation: &Arc<RelationDefinition>) -> MappingResult<()> {
        self.as_end_point().set_relation_definition(relation)
    }
}

impl fmt::Display for AnyRelationEndPointDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}
