use crate::core::commands::{Command, CommandResult};
use crate::core::execution::config::SimulationConfig;
use crate::core::execution::simulation_engine::SimulationEngine;
use log::{debug, warn};
use std::collections::VecDeque;

/// Linear undo/redo history
#[derive(Default)]
pub struct CommandManager {
    undo_stack: VecDeque<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    history_limit: Option<usize>,
}

impl CommandManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// History bounded to `limit` entries, the oldest is evicted first
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            history_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            history_limit: config.history_limit,
            ..Self::default()
        }
    }

    /// Execute `command` and record it on success.
    ///
    /// A command that fails after applying part of its work is recorded too, and
    /// its [`CommandResult::Partial`] result is returned so the caller can undo it.
    pub fn execute<C: Command + 'static>(&mut self, engine: &mut SimulationEngine, command: C) -> Option<CommandResult> {
        self.execute_boxed(engine, Box::new(command))
    }

    pub fn execute_boxed(&mut self, engine: &mut SimulationEngine, mut command: Box<dyn Command>) -> Option<CommandResult> {
        if !command.execute(engine) {
            if !command.partially_applied() {
                debug!("Command {} made no change, not recorded", command.name());
                return None;
            }
            warn!("Command {} failed part way, recording what it applied", command.name());
        }

        let result = command.result();
        debug!("Executed {}: {:?}", command.name(), result);
        self.redo_stack.clear();
        self.push_undo(command);
        Some(result)
    }

    /// Revert the most recent command
    pub fn undo(&mut self, engine: &mut SimulationEngine) -> Option<CommandResult> {
        let mut command = self.undo_stack.pop_back()?;
        let result = command.undo(engine);
        debug!("Undid {}", command.name());
        self.redo_stack.push(command);
        Some(result)
    }

    /// Re-apply the most recently undone command
    pub fn redo(&mut self, engine: &mut SimulationEngine) -> Option<CommandResult> {
        let mut command = self.redo_stack.pop()?;
        if !command.redo(engine) && !command.partially_applied() {
            warn!("Redo of {} failed, dropping it from history", command.name());
            return None;
        }
        let result = command.result();
        debug!("Redid {}", command.name());
        self.push_undo(command);
        Some(result)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Forget all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn push_undo(&mut self, command: Box<dyn Command>) {
        self.undo_stack.push_back(command);
        if let Some(limit) = self.history_limit {
            while self.undo_stack.len() > limit {
                if let Some(evicted) = self.undo_stack.pop_front() {
                    debug!("History full, evicted {}", evicted.name());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commands::{AddCommand, CompositeCommand, SetInputCommand};
    use crate::core::components::catalog::ComponentCatalog;
    use crate::core::types::{ComponentId, ComponentType, LogicState};
    use std::sync::Arc;

    fn engine() -> SimulationEngine {
        SimulationEngine::new(Arc::new(ComponentCatalog::with_builtins()))
    }

    #[test]
    fn test_failed_command_is_not_recorded() {
        let mut engine = engine();
        let mut manager = CommandManager::new();
        let input = engine.add_component(&ComponentType::Input, None, None);

        assert!(manager
            .execute(&mut engine, SetInputCommand::new(input, LogicState::Low))
            .is_none());
        assert!(!manager.can_undo());

        assert!(manager
            .execute(&mut engine, SetInputCommand::new(input, LogicState::High))
            .is_some());
        assert_eq!(manager.undo_len(), 1);
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut engine = engine();
        let mut manager = CommandManager::new();
        manager.execute(&mut engine, AddCommand::single(ComponentType::And));
        manager.undo(&mut engine);
        assert!(manager.can_redo());

        manager.execute(&mut engine, AddCommand::single(ComponentType::Or));
        assert!(!manager.can_redo());
        assert!(manager.redo(&mut engine).is_none());
    }

    #[test]
    fn test_partial_composite_is_recorded() {
        let mut engine = engine();
        let mut manager = CommandManager::new();
        let composite = CompositeCommand::new()
            .with(AddCommand::single(ComponentType::And))
            .with(SetInputCommand::new(ComponentId::new(), LogicState::High));

        let Some(CommandResult::Partial { failed_index, applied }) = manager.execute(&mut engine, composite) else {
            panic!("expected a partial result");
        };
        assert_eq!(failed_index, 1);
        assert_eq!(applied.len(), 1);
        assert_eq!(engine.component_count(), 1);
        assert!(manager.can_undo());

        manager.undo(&mut engine);
        assert_eq!(engine.component_count(), 0);

        // Redo applies the same prefix again and keeps it undoable
        assert!(matches!(manager.redo(&mut engine), Some(CommandResult::Partial { failed_index: 1, .. })));
        assert_eq!(engine.component_count(), 1);
        manager.undo(&mut engine);
        assert_eq!(engine.component_count(), 0);
    }

    #[test]
    fn test_composite_failing_first_step_is_not_recorded() {
        let mut engine = engine();
        let mut manager = CommandManager::new();
        let composite = CompositeCommand::new().with(SetInputCommand::new(ComponentId::new(), LogicState::High));
        assert!(manager.execute(&mut engine, composite).is_none());
        assert!(!manager.can_undo());
    }

    #[test]
    fn test_history_limit_evicts_oldest() {
        let mut engine = engine();
        let mut manager = CommandManager::from_config(&SimulationConfig::new().with_history_limit(2));
        for _ in 0..3 {
            manager.execute(&mut engine, AddCommand::single(ComponentType::Not));
        }
        assert_eq!(manager.undo_len(), 2);
        manager.undo(&mut engine);
        manager.undo(&mut engine);
        assert!(manager.undo(&mut engine).is_none());
        assert_eq!(engine.component_count(), 1);

        manager.clear();
        assert!(!manager.can_undo() && !manager.can_redo());
    }
}
