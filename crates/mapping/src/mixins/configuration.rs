//! Mixin configuration
//!
//! A [`MixinConfiguration`] describes which mixins are applied to which
//! domain types. The mapping captures one per class when it is built, and the
//! active one can be compared against it later.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::reflection::{ClassDeclaration, MixinDeclaration, MixinKind};

/// One mixin applied to a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixinContext {
    pub mixin_type: String,
    pub kind: MixinKind,
    pub is_persistent: bool,
}

impl MixinContext {
    pub fn new(mixin_type: impl Into<String>, kind: MixinKind, is_persistent: bool) -> Self {
        Self {
            mixin_type: mixin_type.into(),
            kind,
            is_persistent,
        }
    }
}

impl From<&MixinDeclaration> for MixinContext {
    fn from(declaration: &MixinDeclaration) -> Self {
        Self::new(
            declaration.mixin_type.full_name.clone(),
            declaration.kind,
            declaration.is_persistent,
        )
    }
}

impl fmt::Display for MixinContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.mixin_type, self.kind)
    }
}

/// The mixins applied to one class, keyed by mixin type name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassContext {
    pub class_type: String,
    #[serde(default)]
    mixins: BTreeMap<String, MixinContext>,
}

impl ClassContext {
    pub fn new(class_type: impl Into<String>) -> Self {
        Self {
            class_type: class_type.into(),
            mixins: BTreeMap::new(),
        }
    }

    pub fn from_declaration(declaration: &ClassDeclaration) -> Self {
        declaration
            .mixins
            .iter()
            .fold(Self::new(declaration.type_name()), |context, mixin| {
                context.with_mixin(MixinContext::from(mixin))
            })
    }

    pub fn with_mixin(mut self, mixin: MixinContext) -> Self {
        self.add_mixin(mixin);
        self
    }

    /// Add or replace a mixin
    pub fn add_mixin(&mut self, mixin: MixinContext) {
        self.mixins.insert(mixin.mixin_type.clone(), mixin);
    }

    pub fn mixins(&self) -> impl Iterator<Item = &MixinContext> {
        self.mixins.values()
    }

    pub fn contains_mixin(&self, mixin_type: &str) -> bool {
        self.mixins.contains_key(mixin_type)
    }

    pub fn is_empty(&self) -> bool {
        self.mixins.is_empty()
    }

    /// Same mixins, ignoring the class type the context was captured for
    pub fn has_same_mixins(&self, other: &ClassContext) -> bool {
        self.mixins == other.mixins
    }
}

impl fmt::Display for ClassContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mixins.is_empty() {
            return write!(f, "ClassContext: '{}' (no mixins)", self.class_type);
        }

        let mixins: Vec<String> = self.mixins.values().map(ToString::to_string).collect();
        write!(
            f,
            "ClassContext: '{}' (mixins: {})",
            self.class_type,
            mixins.join(", ")
        )
    }
}

/// Mixin setup of all configured classes, keyed by class type name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixinConfiguration {
    #[serde(default)]
    class_contexts: BTreeMap<String, ClassContext>,
}

impl MixinConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration as declared on the given classes; classes without mixins are left out
    pub fn from_declarations<'a>(declarations: impl IntoIterator<Item = &'a ClassDeclaration>) -> Self {
        declarations
            .into_iter()
            .filter(|declaration| !declaration.mixins.is_empty())
            .fold(Self::new(), |configuration, declaration| {
                configuration.with_class_context(ClassContext::from_declaration(declaration))
            })
    }

    pub fn with_class_context(mut self, context: ClassContext) -> Self {
        self.add_class_context(context);
        self
    }

    pub fn add_class_context(&mut self, context: ClassContext) {
        self.class_contexts.insert(context.class_type.clone(), context);
    }

    pub fn remove_class_context(&mut self, class_type: &str) -> Option<ClassContext> {
        self.class_contexts.remove(class_type)
    }

    pub fn get_context(&self, class_type: &str) -> Option<&ClassContext> {
        self.class_contexts.get(class_type)
    }

    pub fn class_contexts(&self) -> impl Iterator<Item = &ClassContext> {
        self.class_contexts.values()
    }

    pub fn len(&self) -> usize {
        self.class_contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.class_contexts.is_empty()
    }
}

/// Build-time snapshot of a class's mixins and the persistent ones among them
#[derive(Debug, Clone, Default)]
pub struct PersistentMixinFinder {
    mixin_configuration: Option<ClassContext>,
    persistent_mixins: Vec<String>,
}

impl PersistentMixinFinder {
    pub fn new(mixin_configuration: Option<ClassContext>) -> Self {
        let persistent_mixins = mixin_configuration
            .iter()
            .flat_map(ClassContext::mixins)
            .filter(|mixin| mixin.is_persistent)
            .map(|mixin| mixin.mixin_type.clone())
            .collect();

        Self {
            mixin_configuration,
            persistent_mixins,
        }
    }

    /// Snapshot of a declaration; declaration order is kept for the persistent mixin list
    pub fn from_declaration(declaration: &ClassDeclaration) -> Self {
        if declaration.mixins.is_empty() {
            return Self::empty();
        }

        Self {
            mixin_configuration: Some(ClassContext::from_declaration(declaration)),
            persistent_mixins: declaration
                .mixins
                .iter()
                .filter(|mixin| mixin.is_persistent)
                .map(|mixin| mixin.mixin_type.full_name.clone())
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn mixin_configuration(&self) -> Option<&ClassContext> {
        self.mixin_configuration.as_ref()
    }

    pub fn persistent_mixins(&self) -> &[String] {
        &self.persistent_mixins
    }

    pub fn find_persistent_mixin(&self, mixin_type: &str) -> Option<&str> {
        self.persistent_mixins
            .iter()
            .find(|mixin| mixin.as_str() == mixin_type)
            .map(String::as_str)
    }
}
