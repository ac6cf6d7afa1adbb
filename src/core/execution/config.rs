//! Configuration for simulation execution
//!
//! This module provides configuration types for controlling the engine: the
//! concurrency used for independent forks, step budgets and undo history size.

/// Enumeration of supported concurrency modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyMode {
    /// Forks are simulated one after another on the calling thread
    #[default]
    Sequential,
    /// Forks are simulated in parallel using Rayon
    Rayon,
}

/// Default number of time steps `settle` may take
pub const DEFAULT_SETTLE_STEP_BUDGET: usize = 10_000;

/// Configuration for simulation execution
///
/// The drain loop of a single engine is always single threaded. Concurrency only
/// applies to work that runs on independent copies of the engine, such as truth
/// table generation.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// The concurrency mode to use for forked simulations
    pub concurrency_mode: ConcurrencyMode,
    /// The size of the thread pool for parallel execution
    /// Only relevant when concurrency_mode is Rayon
    pub thread_pool_size: Option<usize>,
    /// Step budget used when settling
    pub settle_step_budget: usize,
    /// Maximum number of undoable commands kept, unbounded when `None`
    pub history_limit: Option<usize>,
}

impl SimulationConfig {
    /// Create a new simulation configuration with default values
    ///
    /// Default configuration uses Sequential mode with no thread pool
    pub fn new() -> Self {
        Self {
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
            settle_step_budget: DEFAULT_SETTLE_STEP_BUDGET,
            history_limit: None,
        }
    }

    /// Set the concurrency mode for forked simulations
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the thread pool size for parallel execution
    ///
    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    pub fn with_settle_step_budget(mut self, steps: usize) -> Self {
        self.settle_step_budget = steps;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
