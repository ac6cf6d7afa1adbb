use crate::core::commands::{Command, CommandResult};
use crate::core::execution::simulation_engine::SimulationEngine;
use crate::core::types::{ComponentId, LogicState, PinType};

/// Drive an input component to a new value
pub struct SetInputCommand {
    id: ComponentId,
    state: LogicState,
    previous: LogicState,
}

impl SetInputCommand {
    pub fn new(id: ComponentId, state: LogicState) -> Self {
        Self {
            id,
            state,
            previous: LogicState::default(),
        }
    }
}

impl Command for SetInputCommand {
    fn execute(&mut self, engine: &mut SimulationEngine) -> bool {
        let Some(previous) = engine.get_digital_pin_state(self.id, PinType::Output, 0) else {
            return false;
        };
        // Unchanged value is a no-op and stays out of history
        if previous == self.state {
            return false;
        }
        self.previous = previous;
        engine.set_digital_input(self.id, self.state)
    }

    fn undo(&mut self, engine: &mut SimulationEngine) -> CommandResult {
        engine.set_digital_input(self.id, self.previous);
        CommandResult::InputSet {
            id: self.id,
            state: self.previous,
        }
    }

    fn result(&self) -> CommandResult {
        CommandResult::InputSet {
            id: self.id,
            state: self.state,
        }
    }

    fn name(&self) -> &'static str {
        "set"
    }
}
