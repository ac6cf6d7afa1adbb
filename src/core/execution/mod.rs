pub mod config;
pub mod event_scheduler;
pub mod simulation_engine;
pub mod truth_table;

// Re-export commonly used types
pub use config::{ConcurrencyMode, SimulationConfig};
pub use event_scheduler::{EventScheduler, SimulationEvent};
pub use simulation_engine::{SimulationEngine, SimulationObserver};
pub use truth_table::{TruthTable, TruthTableRow};
