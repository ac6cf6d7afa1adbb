use crate::core::commands::{Command, CommandResult};
use crate::core::execution::simulation_engine::SimulationEngine;
use log::warn;

/// Ordered group of commands recorded as one history entry.
///
/// A failing sub-command stops the sequence but the ones already applied are
/// left in place; [`failed_index`](Self::failed_index) reports where it stopped
/// and [`undo`](Command::undo) reverts only what was applied. After such a
/// failure [`result`](Command::result) is [`CommandResult::Partial`].
pub struct CompositeCommand {
    commands: Vec<Box<dyn Command>>,
    executed: usize,
    failed_index: Option<usize>,
}

impl CompositeCommand {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            executed: 0,
            failed_index: None,
        }
    }

    pub fn with(mut self, command: impl Command + 'static) -> Self {
        self.commands.push(Box::new(command));
        self
    }

    pub fn push(&mut self, command: Box<dyn Command>) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Index of the sub-command that failed during the last execution
    pub fn failed_index(&self) -> Option<usize> {
        self.failed_index
    }

    /// Number of sub-commands currently applied
    pub fn executed(&self) -> usize {
        self.executed
    }

    fn run(&mut self, engine: &mut SimulationEngine, redo: bool) -> bool {
        self.executed = 0;
        self.failed_index = None;
        for (index, command) in self.commands.iter_mut().enumerate() {
            let ok = if redo {
                command.redo(engine)
            } else {
                command.execute(engine)
            };
            if !ok {
                warn!(
                    "Composite stopped at {} ({}), earlier commands stay applied",
                    index,
                    command.name()
                );
                self.failed_index = Some(index);
                return false;
            }
            self.executed = index + 1;
        }
        !self.commands.is_empty()
    }
}

impl Default for CompositeCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for CompositeCommand {
    fn execute(&mut self, engine: &mut SimulationEngine) -> bool {
        self.run(engine, false)
    }

    fn undo(&mut self, engine: &mut SimulationEngine) -> CommandResult {
        let results = self.commands[..self.executed]
            .iter_mut()
            .rev()
            .map(|command| command.undo(engine))
            .collect();
        self.executed = 0;
        CommandResult::Composite(results)
    }

    fn redo(&mut self, engine: &mut SimulationEngine) -> bool {
        self.run(engine, true)
    }

    fn result(&self) -> CommandResult {
        let applied = self.commands[..self.executed]
            .iter()
            .map(|command| command.result())
            .collect();
        match self.failed_index {
            Some(failed_index) => CommandResult::Partial { failed_index, applied },
            None => CommandResult::Composite(applied),
        }
    }

    fn partially_applied(&self) -> bool {
        self.failed_index.is_some() && self.executed > 0
    }

    fn name(&self) -> &'static str {
        "composite"
    }
}
