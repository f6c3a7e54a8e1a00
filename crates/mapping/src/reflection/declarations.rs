//! Reflected domain declarations
//!
//! Plain data describing domain types the way a type-discovery collaborator
//! hands them to the mapping builder. Everything here can be built in code or
//! deserialized from JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PROPERTY_INFO_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a reflected property descriptor.
///
/// Two descriptors are the same property iff their ids are equal, no matter
/// what their names currently say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyInfoId(u64);

impl PropertyInfoId {
    pub fn next() -> Self {
        Self(NEXT_PROPERTY_INFO_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A reflected type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeInfo {
    pub full_name: String,
    /// Open generic definition for a closed generic type (`Ns.Foo`1` for `Ns.Foo`1[Int32]`)
    #[serde(default)]
    pub generic_type_definition: Option<String>,
}

impl TypeInfo {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            generic_type_definition: None,
        }
    }

    /// A closed instantiation of an open generic type definition
    pub fn closed_generic(definition: impl Into<String>, arguments: &[&str]) -> Self {
        let definition = definition.into();
        Self {
            full_name: format!("{}[{}]", definition, arguments.join(",")),
            generic_type_definition: Some(definition),
        }
    }

    pub fn is_closed_generic(&self) -> bool {
        self.generic_type_definition.is_some()
    }

    /// Name used in qualified property names: the open definition for closed generics
    pub fn name_for_mapping(&self) -> &str {
        self.generic_type_definition
            .as_deref()
            .unwrap_or(&self.full_name)
    }

    /// Unqualified type name without namespace, nesting or generic arity
    pub fn short_name(&self) -> &str {
        let name = self.name_for_mapping();
        let name = name.rsplit(['.', '+']).next().unwrap_or(name);
        name.split('`').next().unwrap_or(name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// A reflected property descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInfo {
    #[serde(skip, default = "PropertyInfoId::next")]
    id: PropertyInfoId,
    pub name: String,
    pub declaring_type: TypeInfo,
    /// Type that first introduced the member, when this declaration overrides it
    #[serde(default)]
    pub original_declaring_type: Option<TypeInfo>,
    #[serde(default)]
    pub is_override: bool,
}

impl PropertyInfo {
    pub fn new(name: impl Into<String>, declaring_type: TypeInfo) -> Self {
        Self {
            id: PropertyInfoId::next(),
            name: name.into(),
            declaring_type,
            original_declaring_type: None,
            is_override: false,
        }
    }

    /// An override of a member first introduced on `original_declaring_type`
    pub fn overriding(
        name: impl Into<String>,
        declaring_type: TypeInfo,
        original_declaring_type: TypeInfo,
    ) -> Self {
        Self {
            id: PropertyInfoId::next(),
            name: name.into(),
            declaring_type,
            original_declaring_type: Some(original_declaring_type),
            is_override: true,
        }
    }

    pub fn id(&self) -> PropertyInfoId {
        self.id
    }

    /// The same descriptor observed under a different name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// Semantic value type of a property
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Boolean,
    Byte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    Binary,
    DateTime,
    Guid,
    Enum(String),
    /// Reserved type of stored object references (foreign keys)
    ObjectId,
    /// Single-valued reference to another domain object
    DomainObject(String),
    /// Collection of domain objects
    DomainObjectCollection(String),
    Custom(String),
}

impl PropertyType {
    /// Value types are never null unless declared optional
    pub fn is_value_type(&self) -> bool {
        !matches!(
            self,
            Self::String
                | Self::Binary
                | Self::ObjectId
                | Self::DomainObject(_)
                | Self::DomainObjectCollection(_)
                | Self::Custom(_)
        )
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum(name) | Self::Custom(name) => f.write_str(name),
            Self::DomainObject(name) => f.write_str(name),
            Self::DomainObjectCollection(name) => write!(f, "ObjectList<{}>", name),
            other => write!(f, "{:?}", other),
        }
    }
}

/// How a property is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StorageClass {
    #[default]
    Persistent,
    /// Kept for the lifetime of a transaction only
    Transaction,
    /// Not mapped at all
    None,
}

/// Declarative constraints and storage hints on a property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyAttribute {
    Mandatory,
    StringProperty {
        is_nullable: bool,
        maximum_length: Option<u32>,
    },
    BinaryProperty {
        is_nullable: bool,
        maximum_length: Option<u32>,
    },
    DbColumn(String),
}

/// Number of objects on the far side of a relation end point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardinalityType {
    One,
    Many,
}

impl fmt::Display for CardinalityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => f.write_str("One"),
            Self::Many => f.write_str("Many"),
        }
    }
}

/// Relation metadata on a property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationAttribute {
    /// Full name of the related type
    pub opposite_type: String,
    /// Member name of the opposite property; `None` for unidirectional relations
    #[serde(default)]
    pub opposite_property: Option<String>,
    pub cardinality: CardinalityType,
    #[serde(default)]
    pub is_mandatory: bool,
    /// Whether this side stores the foreign key column
    pub contains_foreign_key: bool,
    #[serde(default)]
    pub sort_expression: Option<String>,
}

impl RelationAttribute {
    /// A single-valued side that stores the foreign key
    pub fn foreign_key(opposite_type: impl Into<String>, opposite_property: Option<&str>) -> Self {
        Self {
            opposite_type: opposite_type.into(),
            opposite_property: opposite_property.map(str::to_string),
            cardinality: CardinalityType::One,
            is_mandatory: false,
            contains_foreign_key: true,
            sort_expression: None,
        }
    }

    /// A single-valued side without a stored column
    pub fn virtual_one(opposite_type: impl Into<String>, opposite_property: &str) -> Self {
        Self {
            opposite_type: opposite_type.into(),
            opposite_property: Some(opposite_property.to_string()),
            cardinality: CardinalityType::One,
            is_mandatory: false,
            contains_foreign_key: false,
            sort_expression: None,
        }
    }

    /// A collection-valued side
    pub fn virtual_many(opposite_type: impl Into<String>, opposite_property: &str) -> Self {
        Self {
            opposite_type: opposite_type.into(),
            opposite_property: Some(opposite_property.to_string()),
            cardinality: CardinalityType::Many,
            is_mandatory: false,
            contains_foreign_key: false,
            sort_expression: None,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.is_mandatory = true;
        self
    }

    pub fn with_sort_expression(mut self, sort_expression: impl Into<String>) -> Self {
        self.sort_expression = Some(sort_expression.into());
        self
    }

    /// Relation sides without a stored column are virtual
    pub fn is_virtual(&self) -> bool {
        !self.contains_foreign_key
    }
}

/// A declared property of a domain type or mixin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDeclaration {
    pub info: PropertyInfo,
    pub property_type: PropertyType,
    /// Declared as optional (`Option<T>` / nullable value type)
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub storage_class: StorageClass,
    #[serde(default)]
    pub attributes: Vec<PropertyAttribute>,
    #[serde(default)]
    pub relation: Option<RelationAttribute>,
}

impl PropertyDeclaration {
    pub fn new(info: PropertyInfo, property_type: PropertyType) -> Self {
        Self {
            info,
            property_type,
            is_optional: false,
            storage_class: StorageClass::Persistent,
            attributes: Vec::new(),
            relation: None,
        }
    }

    /// A relation property; foreign key sides get the reserved `ObjectId` type
    pub fn relation(info: PropertyInfo, relation: RelationAttribute) -> Self {
        let property_type = match relation.cardinality {
            CardinalityType::Many => PropertyType::DomainObjectCollection(relation.opposite_type.clone()),
            CardinalityType::One if relation.contains_foreign_key => PropertyType::ObjectId,
            CardinalityType::One => PropertyType::DomainObject(relation.opposite_type.clone()),
        };
        Self {
            relation: Some(relation),
            ..Self::new(info, property_type)
        }
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    pub fn with_storage_class(mut self, storage_class: StorageClass) -> Self {
        self.storage_class = storage_class;
        self
    }

    pub fn with_attribute(mut self, attribute: PropertyAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_property_type(mut self, property_type: PropertyType) -> Self {
        self.property_type = property_type;
        self
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    /// Relation properties without a stored column
    pub fn is_virtual_relation(&self) -> bool {
        self.relation.as_ref().is_some_and(RelationAttribute::is_virtual)
    }

    pub fn db_column(&self) -> Option<&str> {
        self.attributes.iter().find_map(|attribute| match attribute {
            PropertyAttribute::DbColumn(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

/// How a mixin is attached to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MixinKind {
    Extending,
    Used,
}

impl fmt::Display for MixinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extending => f.write_str("Extending"),
            Self::Used => f.write_str("Used"),
        }
    }
}

/// A mixin applied to a domain type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixinDeclaration {
    pub mixin_type: TypeInfo,
    pub kind: MixinKind,
    /// Persistent mixins contribute mapped properties
    pub is_persistent: bool,
    #[serde(default)]
    pub properties: Vec<PropertyDeclaration>,
}

impl MixinDeclaration {
    pub fn persistent(mixin_type: TypeInfo) -> Self {
        Self {
            mixin_type,
            kind: MixinKind::Extending,
            is_persistent: true,
            properties: Vec::new(),
        }
    }

    pub fn non_persistent(mixin_type: TypeInfo) -> Self {
        Self {
            is_persistent: false,
            ..Self::persistent(mixin_type)
        }
    }

    pub fn with_kind(mut self, kind: MixinKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_property(mut self, property: PropertyDeclaration) -> Self {
        self.properties.push(property);
        self
    }
}

/// A reflected domain class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDeclaration {
    pub type_info: TypeInfo,
    /// Explicit class ID; defaults to the type's short name
    #[serde(default)]
    pub class_id: Option<String>,
    /// Full name of the base type
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub storage_group: Option<String>,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDeclaration>,
    #[serde(default)]
    pub mixins: Vec<MixinDeclaration>,
}

impl ClassDeclaration {
    pub fn new(type_info: TypeInfo) -> Self {
        Self {
            type_info,
            class_id: None,
            base_type: None,
            is_abstract: false,
            storage_group: None,
            table_name: None,
            properties: Vec::new(),
            mixins: Vec::new(),
        }
    }

    pub fn with_class_id(mut self, class_id: impl Into<String>) -> Self {
        self.class_id = Some(class_id.into());
        self
    }

    pub fn with_base_type(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_storage_group(mut self, storage_group: impl Into<String>) -> Self {
        self.storage_group = Some(storage_group.into());
        self
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn with_property(mut self, property: PropertyDeclaration) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_mixin(mut self, mixin: MixinDeclaration) -> Self {
        self.mixins.push(mixin);
        self
    }

    /// Effective class ID
    pub fn class_id(&self) -> &str {
        self.class_id
            .as_deref()
            .unwrap_or_else(|| self.type_info.short_name())
    }

    pub fn type_name(&self) -> &str {
        &self.type_info.full_name
    }

    /// Properties this class contributes: its own, then those of its persistent mixins
    pub fn mapped_members(&self) -> impl Iterator<Item = &PropertyDeclaration> {
        self.properties.iter().chain(
            self.mixins
                .iter()
                .filter(|mixin| mixin.is_persistent)
                .flat_map(|mixin| mixin.properties.iter()),
        )
    }

    /// Find a declared member (own or persistent mixin) by member name
    pub fn find_member(&self, name: &str) -> Option<&PropertyDeclaration> {
        self.mapped_members().find(|property| property.info.name == name)
    }
}
