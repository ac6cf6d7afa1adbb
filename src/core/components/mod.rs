pub mod catalog;
pub mod definition;
pub mod library;
pub mod state;

// Re-export commonly used types
pub use catalog::{ComponentCatalog, ComponentsTree};
pub use definition::{
    simulation_fn, ComponentBehaviorType, ComponentDefinition, ComponentLogic, SimulationError, SimulationFunction,
    SimulationInput, SimulationOutput, SlotsInfo, MAX_EXPRESSION_INPUTS,
};
pub use state::{AuxState, ClockState, ComponentState, FrequencyUnit};
