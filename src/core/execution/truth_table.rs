use crate::core::components::definition::ComponentBehaviorType;
use crate::core::execution::config::ConcurrencyMode;
use crate::core::execution::simulation_engine::SimulationEngine;
use crate::core::types::{ComponentId, ComponentPin, LogicState, PinType};
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Largest number of input variables a table is generated for
pub const MAX_TRUTH_TABLE_INPUTS: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthTableRow {
    pub inputs: Vec<bool>,
    pub outputs: Vec<LogicState>,
}

/// Exhaustive input/output table of a connected circuit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthTable {
    /// Output slots of input components, first is the most significant bit
    pub inputs: Vec<ComponentPin>,
    /// Input slots of output components
    pub outputs: Vec<ComponentPin>,
    pub rows: Vec<TruthTableRow>,
    /// Rows whose fork did not settle within the step budget
    pub unsettled_rows: Vec<usize>,
}

impl SimulationEngine {
    /// Enumerate every input combination of the circuit containing `start`.
    ///
    /// Each row is simulated on an independent fork, so the live engine is not
    /// touched. Returns `None` if the circuit has no inputs, no outputs or too
    /// many inputs.
    pub fn truth_table(&self, start: ComponentId) -> Option<TruthTable> {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for id in self.connected_graph(start) {
            let Some(definition) = self.component_definition(id) else {
                continue;
            };
            let state = self.get_component_state(id)?;
            match definition.behavior {
                ComponentBehaviorType::Input => inputs
                    .extend((0..state.output_states.len()).map(|pin| ComponentPin::new(id, pin))),
                ComponentBehaviorType::Output => outputs
                    .extend((0..state.input_states.len()).map(|pin| ComponentPin::new(id, pin))),
                ComponentBehaviorType::None => {}
            }
        }

        if inputs.is_empty() || outputs.is_empty() {
            warn!("Truth table for {} needs at least one input and one output", start);
            return None;
        }
        if inputs.len() > MAX_TRUTH_TABLE_INPUTS {
            warn!(
                "Truth table for {} has {} inputs, limit is {}",
                start,
                inputs.len(),
                MAX_TRUTH_TABLE_INPUTS
            );
            return None;
        }

        let budget = self.config().settle_step_budget;
        let row_count = 1usize << inputs.len();
        let forks: Vec<(usize, SimulationEngine)> = (0..row_count).map(|row| (row, self.fork())).collect();

        let run_row = |(row, mut fork): (usize, SimulationEngine)| -> (TruthTableRow, bool) {
            let bits: Vec<bool> = (0..inputs.len())
                .map(|i| row >> (inputs.len() - 1 - i) & 1 == 1)
                .collect();
            for (pin, bit) in inputs.iter().zip(&bits) {
                fork.set_output_slot_state(pin.component, pin.pin, LogicState::from_bool(*bit));
            }
            let settled = fork.settle(budget);
            let values = outputs
                .iter()
                .map(|pin| {
                    fork.get_digital_pin_state(pin.component, PinType::Input, pin.pin)
                        .unwrap_or_default()
                })
                .collect();
            (
                TruthTableRow {
                    inputs: bits,
                    outputs: values,
                },
                settled,
            )
        };

        let results: Vec<(TruthTableRow, bool)> = match self.config().concurrency_mode {
            ConcurrencyMode::Sequential => forks.into_iter().map(run_row).collect(),
            ConcurrencyMode::Rayon => match self.config().thread_pool_size {
                Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                    Ok(pool) => pool.install(|| forks.into_par_iter().map(run_row).collect()),
                    Err(e) => {
                        warn!("Could not build a {} thread pool, using the global pool: {}", threads, e);
                        forks.into_par_iter().map(run_row).collect()
                    }
                },
                None => forks.into_par_iter().map(run_row).collect(),
            },
        };

        let unsettled_rows: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, (_, settled))| !settled)
            .map(|(row, _)| row)
            .collect();
        let rows = results.into_iter().map(|(row, _)| row).collect();

        debug!(
            "Truth table for {}: {} inputs, {} outputs, {} rows",
            start,
            inputs.len(),
            outputs.len(),
            row_count
        );

        Some(TruthTable {
            inputs,
            outputs,
            rows,
            unsettled_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::catalog::ComponentCatalog;
    use crate::core::execution::config::SimulationConfig;
    use crate::core::types::ComponentType;
    use std::sync::Arc;

    fn and_circuit(config: SimulationConfig) -> (SimulationEngine, ComponentId) {
        let mut engine = SimulationEngine::with_config(Arc::new(ComponentCatalog::with_builtins()), config);
        let a = engine.add_component(&ComponentType::Input, None, None);
        let b = engine.add_component(&ComponentType::Input, None, None);
        let gate = engine.add_component(&ComponentType::And, None, None);
        let out = engine.add_component(&ComponentType::Output, None, None);
        assert!(engine.connect_component(a, 0, PinType::Output, gate, 0, PinType::Input, false));
        assert!(engine.connect_component(b, 0, PinType::Output, gate, 1, PinType::Input, false));
        assert!(engine.connect_component(gate, 0, PinType::Output, out, 0, PinType::Input, false));
        (engine, gate)
    }

    fn outputs(table: &TruthTable) -> Vec<LogicState> {
        table.rows.iter().map(|row| row.outputs[0]).collect()
    }

    #[test]
    fn test_and_gate_table() {
        let (engine, gate) = and_circuit(SimulationConfig::default());
        let table = engine.truth_table(gate).unwrap();

        assert_eq!(table.inputs.len(), 2);
        assert_eq!(table.outputs.len(), 1);
        assert_eq!(table.rows[1].inputs, vec![false, true]);
        assert_eq!(table.rows[2].inputs, vec![true, false]);
        assert_eq!(
            outputs(&table),
            vec![LogicState::Low, LogicState::Low, LogicState::Low, LogicState::High]
        );
        assert!(table.unsettled_rows.is_empty());
        // Live engine is untouched
        assert_eq!(engine.current_time(), 0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (sequential, gate) = and_circuit(SimulationConfig::default());
        let (parallel, parallel_gate) = and_circuit(
            SimulationConfig::new()
                .with_concurrency(ConcurrencyMode::Rayon)
                .with_thread_pool_size(2),
        );
        let expected = sequential.truth_table(gate).unwrap();
        let actual = parallel.truth_table(parallel_gate).unwrap();
        assert_eq!(outputs(&expected), outputs(&actual));
    }

    #[test]
    fn test_circuit_without_outputs() {
        let mut engine = SimulationEngine::new(Arc::new(ComponentCatalog::with_builtins()));
        let input = engine.add_component(&ComponentType::Input, None, None);
        assert!(engine.truth_table(input).is_none());
    }
}
