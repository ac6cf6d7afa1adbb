//! # bess_sim
//!
//! Discrete-event digital logic simulator.
//!
//! Components are instantiated from a [`ComponentCatalog`] into a
//! [`SimulationEngine`], wired pin to pin, and driven by input stimuli. Every
//! input change schedules a re-evaluation after the component's propagation
//! delay; changed outputs schedule the components they drive in turn.
//! Edits made through the [`CommandManager`] can be undone and redone.
//!
//! ```rust
//! use bess_sim::{ComponentCatalog, ComponentType, LogicState, PinType, SimulationEngine};
//! use std::sync::Arc;
//!
//! let mut engine = SimulationEngine::new(Arc::new(ComponentCatalog::with_builtins()));
//! let a = engine.add_component(&ComponentType::Input, None, None);
//! let gate = engine.add_component(&ComponentType::Not, None, None);
//! engine.connect_component(a, 0, PinType::Output, gate, 0, PinType::Input, false);
//!
//! engine.set_digital_input(a, LogicState::High);
//! engine.settle(100);
//! assert_eq!(engine.get_digital_pin_state(gate, PinType::Output, 0), Some(LogicState::Low));
//! ```

pub mod core;

// Re-export commonly used types
pub use crate::core::commands::{
    AddCommand, AddRequest, Command, CommandError, CommandManager, CommandProcessor, CommandResult,
    CompositeCommand, ConnectCommand, DeleteCommand, DeleteConnectionCommand, Endpoints, SetInputCommand,
};
pub use crate::core::components::{
    AuxState, ClockState, ComponentBehaviorType, ComponentCatalog, ComponentDefinition, ComponentLogic,
    ComponentState, FrequencyUnit, SimulationError, SimulationInput, SimulationOutput, SlotsInfo,
};
pub use crate::core::connections::ConnectionError;
pub use crate::core::execution::{
    ConcurrencyMode, SimulationConfig, SimulationEngine, SimulationEvent, SimulationObserver, TruthTable,
};
pub use crate::core::expression::{evaluate, ExpressionError};
pub use crate::core::graph::{ConnectionBundle, ConnectionRecord};
pub use crate::core::serialization::{ComponentSnapshot, EngineSnapshot, SnapshotError};
pub use crate::core::types::{ComponentId, ComponentPin, ComponentType, LogicState, PinType, SimTime, SlotState};

/// Install `env_logger` as the log backend.
///
/// `RUST_LOG` takes precedence over `level` when set. Returns false if a logger
/// was already installed, which makes repeated calls harmless.
pub fn init_logging(level: &str) -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init()
        .is_ok()
}
