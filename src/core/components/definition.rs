use crate::core::components::state::AuxState;
use crate::core::expression::{self, ExpressionError};
use crate::core::types::{ComponentType, LogicState, SimTime, SlotState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors produced by a component's simulation function
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("expression error: {0}")]
    Expression(#[from] ExpressionError),

    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error("invalid clock: {0}")]
    InvalidClock(String),
}

/// Slot layout on one side of a component
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotsInfo {
    pub count: usize,
    pub is_resizeable: bool,
    pub names: Vec<String>,
}

impl SlotsInfo {
    pub fn fixed(count: usize) -> Self {
        Self {
            count,
            is_resizeable: false,
            names: Vec::new(),
        }
    }

    pub fn resizeable(count: usize) -> Self {
        Self {
            count,
            is_resizeable: true,
            names: Vec::new(),
        }
    }

    pub fn named(names: &[&str]) -> Self {
        Self {
            count: names.len(),
            is_resizeable: false,
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

/// How the outside world interacts with a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentBehaviorType {
    #[default]
    None,
    Input,
    Output,
}

/// Everything a simulation function may look at
pub struct SimulationInput<'a> {
    pub inputs: &'a [LogicState],
    /// Outputs before this evaluation
    pub outputs: &'a [SlotState],
    pub expressions: &'a [String],
    pub time: SimTime,
    pub aux: &'a AuxState,
}

/// Result of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    pub outputs: Vec<LogicState>,
    pub aux: AuxState,
    /// Delay after which the component wants to be evaluated again
    pub reschedule_after: Option<SimTime>,
}

impl SimulationOutput {
    pub fn new(outputs: Vec<LogicState>, aux: AuxState) -> Self {
        Self {
            outputs,
            aux,
            reschedule_after: None,
        }
    }
}

pub type SimulationFunction =
    Arc<dyn Fn(&SimulationInput<'_>) -> Result<SimulationOutput, SimulationError> + Send + Sync>;

/// Wrap a closure or function as a [`SimulationFunction`]
pub fn simulation_fn<F>(function: F) -> SimulationFunction
where
    F: Fn(&SimulationInput<'_>) -> Result<SimulationOutput, SimulationError> + Send + Sync + 'static,
{
    Arc::new(function)
}

/// How a definition computes its outputs
#[derive(Clone)]
pub enum ComponentLogic {
    /// One expression per output slot
    Expressions(Vec<String>),
    /// Gate built from a binary operator folded over all inputs, or `!` applied pairwise
    Operator { op: char, negate: bool },
    Function(SimulationFunction),
}

impl fmt::Debug for ComponentLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentLogic::Expressions(exprs) => f.debug_tuple("Expressions").field(exprs).finish(),
            ComponentLogic::Operator { op, negate } => f
                .debug_struct("Operator")
                .field("op", op)
                .field("negate", negate)
                .finish(),
            ComponentLogic::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Immutable description of a component kind
#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    pub component_type: ComponentType,
    pub name: String,
    pub category: String,
    pub input_slots: SlotsInfo,
    pub output_slots: SlotsInfo,
    pub delay: SimTime,
    pub behavior: ComponentBehaviorType,
    pub logic: ComponentLogic,
    pub auto_reschedule: bool,
    /// Instances keep a timestamped history of their first input
    pub monitors_input: bool,
    pub initial_aux: AuxState,
}

/// Highest input index a single-digit expression can address
pub const MAX_EXPRESSION_INPUTS: usize = 10;

impl ComponentDefinition {
    pub fn new(
        component_type: ComponentType,
        name: &str,
        category: &str,
        input_slots: SlotsInfo,
        output_slots: SlotsInfo,
        delay: SimTime,
        logic: ComponentLogic,
    ) -> Self {
        Self {
            component_type,
            name: name.to_string(),
            category: category.to_string(),
            input_slots,
            output_slots,
            delay,
            behavior: ComponentBehaviorType::None,
            logic,
            auto_reschedule: false,
            monitors_input: false,
            initial_aux: AuxState::None,
        }
    }

    pub fn with_behavior(mut self, behavior: ComponentBehaviorType) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_auto_reschedule(mut self) -> Self {
        self.auto_reschedule = true;
        self
    }

    pub fn with_input_monitor(mut self) -> Self {
        self.monitors_input = true;
        self
    }

    pub fn with_aux(mut self, aux: AuxState) -> Self {
        self.initial_aux = aux;
        self
    }

    pub fn is_expression_based(&self) -> bool {
        !matches!(self.logic, ComponentLogic::Function(_))
    }

    /// Expressions an instance with the given slot counts evaluates
    pub fn expressions_for(&self, input_count: usize, output_count: usize) -> Vec<String> {
        match &self.logic {
            ComponentLogic::Expressions(exprs) => exprs.clone(),
            ComponentLogic::Operator { op: '!', .. } => {
                (0..output_count).map(|i| format!("!{}", i)).collect()
            }
            ComponentLogic::Operator { op, negate } => {
                let joined = (0..input_count)
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(&op.to_string());
                let expr = if *negate {
                    format!("!({})", joined)
                } else {
                    joined
                };
                vec![expr; output_count]
            }
            ComponentLogic::Function(_) => Vec::new(),
        }
    }

    /// Compute new outputs for one evaluation
    pub fn simulate(&self, input: &SimulationInput<'_>) -> Result<SimulationOutput, SimulationError> {
        if let ComponentLogic::Function(function) = &self.logic {
            return function(input);
        }

        if input.expressions.len() != input.outputs.len() {
            return Err(SimulationError::Evaluation(format!(
                "{} has {} expressions for {} outputs",
                self.name,
                input.expressions.len(),
                input.outputs.len()
            )));
        }

        let bits: Vec<bool> = input.inputs.iter().map(LogicState::is_high).collect();
        let outputs = input
            .expressions
            .iter()
            .map(|expr| expression::evaluate(expr, &bits).map(LogicState::from_bool))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SimulationOutput::new(outputs, *input.aux))
    }

    /// FNV-1a 64 over every field that affects behaviour
    pub fn content_hash(&self) -> u64 {
        let mut hasher = Fnv1a::new();
        hasher.write_str(&self.component_type.to_string());
        hasher.write_str(&self.name);
        hasher.write_str(&self.category);
        hasher.write_u64(self.delay);
        for slots in [&self.input_slots, &self.output_slots] {
            hasher.write_u64(slots.count as u64);
            hasher.write_bytes(&[slots.is_resizeable as u8]);
            hasher.write_u64(slots.names.len() as u64);
            for name in &slots.names {
                hasher.write_str(name);
                hasher.separator();
            }
        }
        hasher.write_bytes(&[
            self.behavior as u8,
            self.auto_reschedule as u8,
            self.monitors_input as u8,
        ]);
        match &self.logic {
            ComponentLogic::Expressions(exprs) => {
                hasher.write_bytes(b"E");
                hasher.write_u64(exprs.len() as u64);
                for expr in exprs {
                    hasher.write_str(expr);
                    hasher.separator();
                }
            }
            ComponentLogic::Operator { op, negate } => {
                hasher.write_bytes(b"O");
                hasher.write_u64(*op as u64);
                hasher.write_bytes(&[*negate as u8]);
            }
            ComponentLogic::Function(_) => hasher.write_bytes(b"F"),
        }
        hasher.finish()
    }
}

struct Fnv1a(u64);

impl Fnv1a {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 1099511628211;

    fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= *byte as u64;
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    fn write_str(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    // Keeps adjacent strings from hashing like their concatenation
    fn separator(&mut self) {
        self.write_bytes(&[0xff]);
    }

    fn finish(&self) -> u64 {
        self.0
    }
}
