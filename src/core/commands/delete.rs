use crate::core::commands::{Command, CommandResult};
use crate::core::execution::simulation_engine::SimulationEngine;
use crate::core::serialization::ComponentSnapshot;
use crate::core::types::ComponentId;
use log::warn;

/// Delete components together with every connection touching them
pub struct DeleteCommand {
    ids: Vec<ComponentId>,
    snapshots: Vec<ComponentSnapshot>,
}

impl DeleteCommand {
    pub fn new(ids: Vec<ComponentId>) -> Self {
        Self {
            ids,
            snapshots: Vec::new(),
        }
    }
}

impl Command for DeleteCommand {
    fn execute(&mut self, engine: &mut SimulationEngine) -> bool {
        // All snapshots are taken first so edges between deleted components survive
        self.snapshots = self
            .ids
            .iter()
            .filter_map(|id| engine.component_snapshot(*id))
            .collect();
        if self.snapshots.is_empty() {
            warn!("Nothing to delete");
            return false;
        }
        for snapshot in &self.snapshots {
            engine.delete_component(snapshot.instance_id);
        }
        true
    }

    fn undo(&mut self, engine: &mut SimulationEngine) -> CommandResult {
        let mut restored = Vec::new();
        for snapshot in &self.snapshots {
            match engine.restore_component(snapshot) {
                Ok(()) => restored.push(snapshot.instance_id),
                Err(e) => warn!("Cannot restore {}: {}", snapshot.instance_id, e),
            }
        }
        for snapshot in &self.snapshots {
            engine.restore_connections(snapshot);
        }
        CommandResult::Added(restored)
    }

    fn result(&self) -> CommandResult {
        CommandResult::Deleted(self.snapshots.iter().map(|s| s.instance_id).collect())
    }

    fn name(&self) -> &'static str {
        "delete"
    }
}
