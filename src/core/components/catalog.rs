use crate::core::components::definition::ComponentDefinition;
use crate::core::components::library;
use crate::core::types::ComponentType;
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

/// Definitions grouped by category
pub type ComponentsTree = BTreeMap<String, Vec<Arc<ComponentDefinition>>>;

/// Registry of component definitions keyed by type
#[derive(Debug, Default)]
pub struct ComponentCatalog {
    definitions: Vec<Arc<ComponentDefinition>>,
    index: HashMap<ComponentType, usize>,
    tree: OnceLock<ComponentsTree>,
}

impl ComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-populated with the built-in library
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        library::register_builtins(&mut catalog);
        info!("Component catalog initialised with {} definitions", catalog.len());
        catalog
    }

    /// Register a definition; a type that is already present is left untouched
    pub fn register(&mut self, definition: ComponentDefinition) -> bool {
        if self.index.contains_key(&definition.component_type) {
            debug!(
                "Definition for {} already registered, skipping",
                definition.component_type
            );
            return false;
        }

        debug!(
            "Registered {} ({}) hash={:016x}",
            definition.name,
            definition.component_type,
            definition.content_hash()
        );
        self.index
            .insert(definition.component_type.clone(), self.definitions.len());
        self.definitions.push(Arc::new(definition));
        true
    }

    /// Look up a definition.
    ///
    /// # Panics
    /// Panics if `component_type` was never registered. Every instance must resolve
    /// to a known definition, so a miss here is a registration bug.
    pub fn definition(&self, component_type: &ComponentType) -> Arc<ComponentDefinition> {
        match self.try_definition(component_type) {
            Some(definition) => definition,
            None => panic!("component type {} is not registered", component_type),
        }
    }

    pub fn try_definition(&self, component_type: &ComponentType) -> Option<Arc<ComponentDefinition>> {
        self.index
            .get(component_type)
            .map(|&i| Arc::clone(&self.definitions[i]))
    }

    pub fn contains(&self, component_type: &ComponentType) -> bool {
        self.index.contains_key(component_type)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<ComponentDefinition>> {
        self.definitions.iter()
    }

    /// Category grouping, built on first use and kept until [`rebuild_tree`](Self::rebuild_tree)
    pub fn components_tree(&self) -> &ComponentsTree {
        self.tree.get_or_init(|| {
            let mut tree = ComponentsTree::new();
            for definition in &self.definitions {
                tree.entry(definition.category.clone())
                    .or_default()
                    .push(Arc::clone(definition));
            }
            tree
        })
    }

    /// Drop the cached grouping so the next call regroups every definition
    pub fn rebuild_tree(&mut self) {
        self.tree = OnceLock::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::definition::{ComponentLogic, SlotsInfo};
    use crate::core::components::library::{GATES_CATEGORY, IO_CATEGORY};

    fn custom(name: &str, delay: u64) -> ComponentDefinition {
        ComponentDefinition::new(
            ComponentType::Custom(name.to_string()),
            name,
            "Plugins",
            SlotsInfo::fixed(1),
            SlotsInfo::fixed(1),
            delay,
            ComponentLogic::Expressions(vec!["0".to_string()]),
        )
    }

    #[test]
    fn test_duplicate_registration_is_noop() {
        let mut catalog = ComponentCatalog::new();
        assert!(catalog.register(custom("buffer", 1)));
        assert!(!catalog.register(custom("buffer", 7)));
        assert_eq!(catalog.len(), 1);
        let def = catalog.definition(&ComponentType::Custom("buffer".into()));
        assert_eq!(def.delay, 1);
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn test_unknown_type_panics() {
        let catalog = ComponentCatalog::new();
        catalog.definition(&ComponentType::And);
    }

    #[test]
    fn test_tree_is_cached_until_rebuild() {
        let mut catalog = ComponentCatalog::with_builtins();
        let io_count = catalog.components_tree()[IO_CATEGORY].len();
        assert!(catalog.components_tree().contains_key(GATES_CATEGORY));

        catalog.register(custom("buffer", 1));
        assert!(!catalog.components_tree().contains_key("Plugins"));

        catalog.rebuild_tree();
        assert_eq!(catalog.components_tree()["Plugins"].len(), 1);
        assert_eq!(catalog.components_tree()[IO_CATEGORY].len(), io_count);
    }

    #[test]
    fn test_builtins_resolve() {
        let catalog = ComponentCatalog::with_builtins();
        for component_type in [
            ComponentType::Input,
            ComponentType::Clock,
            ComponentType::StateMonitor,
            ComponentType::And,
            ComponentType::Not,
            ComponentType::FlipFlopD,
            ComponentType::TriStateBuffer8,
            ComponentType::Comparator2Bit,
        ] {
            assert!(catalog.contains(&component_type), "{}", component_type);
        }
    }
}
