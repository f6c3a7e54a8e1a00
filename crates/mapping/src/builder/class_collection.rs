//! Builds all class definitions, base classes before derived classes

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::object_factory::MappingObjectFactory;
use crate::error::{MappingError, MappingResult};
use crate::model::{ClassDefinition, ClassDefinitionCollection};
use crate::reflection::ClassDeclaration;

pub struct ClassDefinitionCollectionFactory<'a, F: MappingObjectFactory + ?Sized> {
    factory: &'a F,
}

/// Working state while resolving the inheritance hierarchy
struct BuildState<'d> {
    declarations: HashMap<&'d str, &'d Arc<ClassDeclaration>>,
    built: HashMap<String, Arc<ClassDefinition>>,
    in_progress: HashSet<String>,
    classes: ClassDefinitionCollection,
}

impl<'a, F: MappingObjectFactory + ?Sized> ClassDefinitionCollectionFactory<'a, F> {
    pub fn new(factory: &'a F) -> Self {
        Self { factory }
    }

    /// Create a definition per declaration regardless of input order, then
    /// seal the derived classes of every class.
    pub fn create_class_definition_collection(
        &self,
        declarations: &[Arc<ClassDeclaration>],
    ) -> MappingResult<ClassDefinitionCollection> {
        let mut state = BuildState {
            declarations: HashMap::with_capacity(declarations.len()),
            built: HashMap::with_capacity(declarations.len()),
            in_progress: HashSet::new(),
            classes: ClassDefinitionCollection::new(),
        };

        for declaration in declarations {
            if state
                .declarations
                .insert(declaration.type_name(), declaration)
                .is_some()
            {
                return Err(MappingError::configuration(format!(
                    "Type '{}' is declared more than once.",
                    declaration.type_name()
                )));
            }
        }

        for declaration in declarations {
            self.get_or_create(declaration, &mut state)?;
        }

        let classes = state.classes;
        for class in classes.iter() {
            let derived: Vec<Arc<ClassDefinition>> = classes
                .iter()
                .filter(|candidate| {
                    candidate
                        .base_class()
                        .is_some_and(|base| Arc::ptr_eq(base, class))
                })
                .cloned()
                .collect();
            class.set_derived_classes(&derived)?;
        }

        Ok(classes)
    }

    fn get_or_create(
        &self,
        declaration: &Arc<ClassDeclaration>,
        state: &mut BuildState<'_>,
    ) -> MappingResult<Arc<ClassDefinition>> {
        let type_name = declaration.type_name();
        if let Some(existing) = state.built.get(type_name) {
            return Ok(existing.clone());
        }
        if !state.in_progress.insert(type_name.to_string()) {
            return Err(MappingError::configuration(format!(
                "Class '{}' is part of an inheritance cycle.",
                type_name
            )));
        }

        let base_class = match declaration.base_type.as_deref() {
            Some(base_type) => match state.declarations.get(base_type).copied() {
                Some(base_declaration) => Some(self.get_or_create(base_declaration, state)?),
                None => {
                    tracing::warn!(
                        "Base type '{}' of '{}' is not part of the mapping; treating '{}' as an inheritance root",
                        base_type,
                        type_name,
                        type_name
                    );
                    None
                }
            },
            None => None,
        };

        let class_definition = self
            .factory
            .create_class_definition(declaration, base_class.as_ref())?;

        state.classes.add(class_definition.clone())?;
        state.in_progress.remove(type_name);
        state
            .built
            .insert(type_name.to_string(), class_definition.clone());
        Ok(class_definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ReflectionBasedMappingObjectFactory;
    use crate::reflection::TypeInfo;

    fn declaration(type_name: &str, base: Option<&str>) -> Arc<ClassDeclaration> {
        let declaration = ClassDeclaration::new(TypeInfo::new(type_name));
        Arc::new(match base {
            Some(base) => declaration.with_base_type(base),
            None => declaration,
        })
    }

    #[test]
    fn test_base_before_derived_regardless_of_order() {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let declarations = vec![
            declaration("Shop.Customer", Some("Shop.Company")),
            declaration("Shop.Order", None),
            declaration("Shop.Company", None),
            declaration("Shop.Partner", Some("Shop.Company")),
        ];

        let classes = ClassDefinitionCollectionFactory::new(&factory)
            .create_class_definition_collection(&declarations)
            .unwrap();
        let ids: Vec<_> = classes.iter().map(|class| class.id().to_string()).collect();
        assert_eq!(ids, vec!["Company", "Customer", "Order", "Partner"]);

        let company = classes.get_mandatory("Company").unwrap();
        let customer = classes.get_mandatory("Customer").unwrap();
        assert!(Arc::ptr_eq(customer.base_class().unwrap(), company));
        assert_eq!(company.derived_classes().len(), 2);
        assert!(classes.get_mandatory("Order").unwrap().derived_classes().is_empty());

        let roots: Vec<_> = classes
            .inheritance_root_classes()
            .iter()
            .map(|class| class.id().to_string())
            .collect();
        assert_eq!(roots, vec!["Company", "Order"]);
    }

    #[test]
    fn test_unknown_base_type_becomes_root() {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let declarations = vec![declaration("Shop.Customer", Some("Framework.DomainObject"))];
        let classes = ClassDefinitionCollectionFactory::new(&factory)
            .create_class_definition_collection(&declarations)
            .unwrap();
        assert!(classes.get_mandatory("Customer").unwrap().base_class().is_none());
    }

    #[test]
    fn test_inheritance_cycle_rejected() {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let declarations = vec![
            declaration("Shop.A", Some("Shop.B")),
            declaration("Shop.B", Some("Shop.A")),
        ];
        let err = ClassDefinitionCollectionFactory::new(&factory)
            .create_class_definition_collection(&declarations)
            .unwrap_err();
        assert!(err.to_string().contains("inheritance cycle"));
    }

    #[test]
    fn test_duplicate_type_and_class_id_rejected() {
        let factory = ReflectionBasedMappingObjectFactory::default();
        let duplicate_type = vec![declaration("Shop.Order", None), declaration("Shop.Order", None)];
        assert!(ClassDefinitionCollectionFactory::new(&factory)
            .create_class_definition_collection(&duplicate_type)
            .is_err());

        let duplicate_id = vec![declaration("Shop.Order", None), declaration("Archive.Order", None)];
        let err = ClassDefinitionCollectionFactory::new(&factory)
            .create_class_definition_collection(&duplicate_id)
            .unwrap_err();
        assert!(err.to_string().contains("same class ID 'Order'"));
    }
}
