//! Reversible edits of the simulation graph
//!
//! Every edit is a [`Command`] that can be executed, undone and redone against a
//! [`SimulationEngine`]. The [`CommandManager`] keeps the linear undo history.

pub mod add;
pub mod composite;
pub mod connect;
pub mod delete;
pub mod manager;
pub mod processor;
pub mod set_input;

pub use add::{AddCommand, AddRequest};
pub use composite::CompositeCommand;
pub use connect::{ConnectCommand, DeleteConnectionCommand, Endpoints};
pub use delete::DeleteCommand;
pub use manager::CommandManager;
pub use processor::{command_factory, CommandError, CommandFactory, CommandProcessor};
pub use set_input::SetInputCommand;

use crate::core::execution::simulation_engine::SimulationEngine;
use crate::core::graph::ConnectionRecord;
use crate::core::types::{ComponentId, LogicState};

/// Outcome reported by a command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CommandResult {
    #[default]
    None,
    Added(Vec<ComponentId>),
    Deleted(Vec<ComponentId>),
    Connected(ConnectionRecord),
    Disconnected(Vec<ConnectionRecord>),
    Reconnected(Vec<ConnectionRecord>),
    InputSet { id: ComponentId, state: LogicState },
    Composite(Vec<CommandResult>),
    /// Group that stopped at `failed_index`; `applied` holds the results of the steps before it
    Partial {
        failed_index: usize,
        applied: Vec<CommandResult>,
    },
}

/// A reversible mutation of the engine
pub trait Command: Send {
    /// Apply the command. Returns false when nothing was changed, in which case
    /// the command must not enter the undo history.
    fn execute(&mut self, engine: &mut SimulationEngine) -> bool;

    /// Revert a successful [`execute`](Self::execute)
    fn undo(&mut self, engine: &mut SimulationEngine) -> CommandResult;

    /// Apply again after an undo
    fn redo(&mut self, engine: &mut SimulationEngine) -> bool {
        self.execute(engine)
    }

    fn result(&self) -> CommandResult;

    /// True after a failed execute that still left some changes behind.
    /// Such a command is recorded so those changes can be undone.
    fn partially_applied(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}
