use crate::core::commands::{Command, CommandResult};
use crate::core::execution::simulation_engine::SimulationEngine;
use crate::core::serialization::ComponentSnapshot;
use crate::core::types::{ComponentId, ComponentType};
use log::warn;

/// One component to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
    pub component_type: ComponentType,
    pub input_count: Option<usize>,
    pub output_count: Option<usize>,
}

impl AddRequest {
    pub fn new(component_type: ComponentType) -> Self {
        Self {
            component_type,
            input_count: None,
            output_count: None,
        }
    }

    pub fn with_counts(mut self, input_count: usize, output_count: usize) -> Self {
        self.input_count = Some(input_count);
        self.output_count = Some(output_count);
        self
    }
}

/// Create one or more components as a single undoable step.
///
/// Undo snapshots the created components before deleting them; redo brings them
/// back with the same ids, state and any connections they had at undo time.
pub struct AddCommand {
    requests: Vec<AddRequest>,
    ids: Vec<ComponentId>,
    snapshots: Vec<ComponentSnapshot>,
}

impl AddCommand {
    pub fn new(requests: Vec<AddRequest>) -> Self {
        Self {
            requests,
            ids: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    pub fn single(component_type: ComponentType) -> Self {
        Self::new(vec![AddRequest::new(component_type)])
    }

    fn rollback(&mut self, engine: &mut SimulationEngine) {
        for id in self.ids.drain(..) {
            engine.delete_component(id);
        }
    }
}

impl Command for AddCommand {
    fn execute(&mut self, engine: &mut SimulationEngine) -> bool {
        if self.requests.is_empty() {
            return false;
        }
        self.ids.clear();
        for request in &self.requests {
            let id = engine.add_component(&request.component_type, request.input_count, request.output_count);
            if id.is_null() {
                warn!("Add aborted: could not create {}", request.component_type);
                self.rollback(engine);
                return false;
            }
            self.ids.push(id);
        }
        true
    }

    fn undo(&mut self, engine: &mut SimulationEngine) -> CommandResult {
        self.snapshots = self
            .ids
            .iter()
            .filter_map(|id| engine.component_snapshot(*id))
            .collect();
        for id in &self.ids {
            engine.delete_component(*id);
        }
        CommandResult::Deleted(self.ids.clone())
    }

    fn redo(&mut self, engine: &mut SimulationEngine) -> bool {
        if self.snapshots.is_empty() {
            return self.execute(engine);
        }
        for snapshot in &self.snapshots {
            if let Err(e) = engine.restore_component(snapshot) {
                warn!("Cannot redo add: {}", e);
                return false;
            }
        }
        for snapshot in &self.snapshots {
            engine.restore_connections(snapshot);
        }
        true
    }

    fn result(&self) -> CommandResult {
        CommandResult::Added(self.ids.clone())
    }

    fn name(&self) -> &'static str {
        "add"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::catalog::ComponentCatalog;
    use std::sync::Arc;

    fn engine() -> SimulationEngine {
        SimulationEngine::new(Arc::new(ComponentCatalog::with_builtins()))
    }

    #[test]
    fn test_batch_add_undo_redo_keeps_ids() {
        let mut engine = engine();
        let mut command = AddCommand::new(vec![
            AddRequest::new(ComponentType::Input),
            AddRequest::new(ComponentType::Or).with_counts(3, 1),
        ]);

        assert!(command.execute(&mut engine));
        let CommandResult::Added(ids) = command.result() else {
            panic!("expected added ids");
        };
        assert_eq!(ids.len(), 2);

        command.undo(&mut engine);
        assert_eq!(engine.component_count(), 0);

        assert!(command.redo(&mut engine));
        assert_eq!(engine.component_ids(), ids);
        assert_eq!(engine.get_component_state(ids[1]).unwrap().input_states.len(), 3);
    }

    #[test]
    fn test_unknown_type_rolls_back_batch() {
        let mut engine = engine();
        let mut command = AddCommand::new(vec![
            AddRequest::new(ComponentType::And),
            AddRequest::new(ComponentType::Custom("missing".into())),
        ]);
        assert!(!command.execute(&mut engine));
        assert_eq!(engine.component_count(), 0);
        assert!(!engine.has_pending_events());
    }
}
