//! Detects mixin configuration drift after the mapping was built

use super::configuration::{ClassContext, MixinConfiguration};
use crate::error::{MappingError, MappingResult};
use crate::model::ClassDefinition;

/// Checks a built class definition against the current environment
pub struct ClassDefinitionValidator<'a> {
    class_definition: &'a ClassDefinition,
}

impl<'a> ClassDefinitionValidator<'a> {
    pub fn new(class_definition: &'a ClassDefinition) -> Self {
        Self { class_definition }
    }

    /// Fails if the active mixins of the class or any of its base classes differ
    /// from those captured at build time. Each class of the hierarchy is compared
    /// on its own, so moving a mixin between a base and a derived class counts as
    /// a change. Non-persistent mixins count as well.
    pub fn validate_current_mixin_configuration(&self, active: &MixinConfiguration) -> MappingResult<()> {
        if self.class_definition.is_type_not_found() {
            return Ok(());
        }

        for class in self.hierarchy() {
            let original = Self::build_time_context(class);
            let current = Self::active_context(class, active);
            if original.has_same_mixins(&current) {
                continue;
            }

            tracing::warn!(
                "Mixin configuration of '{}' changed after the mapping was built",
                self.class_definition.class_type_name()
            );
            return Err(MappingError::configuration(format!(
                "The mixin configuration for domain object type '{}' was changed after the mapping information was built.\nOriginal configuration: {}.\nActive configuration: {}",
                self.class_definition.class_type_name(),
                original,
                current
            )));
        }
        Ok(())
    }

    fn hierarchy(&self) -> impl Iterator<Item = &'a ClassDefinition> {
        std::iter::once(self.class_definition).chain(self.class_definition.ancestors())
    }

    fn build_time_context(class: &ClassDefinition) -> ClassContext {
        class
            .persistent_mixin_finder()
            .mixin_configuration()
            .cloned()
            .unwrap_or_else(|| ClassContext::new(class.class_type_name()))
    }

    fn active_context(class: &ClassDefinition, active: &MixinConfiguration) -> ClassContext {
        active
            .get_context(class.class_type_name())
            .cloned()
            .unwrap_or_else(|| ClassContext::new(class.class_type_name()))
    }
}
