use crate::core::components::definition::SimulationError;
use crate::core::types::{LogicState, SimTime, SlotState, TICKS_PER_SECOND};
use serde::{Deserialize, Serialize};

/// Unit a clock frequency is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyUnit {
    #[default]
    Hz,
    KHz,
    MHz,
}

impl FrequencyUnit {
    pub fn multiplier(&self) -> f64 {
        match self {
            FrequencyUnit::Hz => 1.0,
            FrequencyUnit::KHz => 1e3,
            FrequencyUnit::MHz => 1e6,
        }
    }
}

/// Clock configuration and current phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockState {
    pub frequency: f64,
    pub unit: FrequencyUnit,
    pub duty_cycle: f64,
    /// Current output phase
    pub high: bool,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            frequency: 1.0,
            unit: FrequencyUnit::Hz,
            duty_cycle: 0.5,
            high: false,
        }
    }
}

impl ClockState {
    pub fn new(frequency: f64, unit: FrequencyUnit) -> Self {
        Self {
            frequency,
            unit,
            ..Self::default()
        }
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency * self.unit.multiplier()
    }

    /// Duration of the current phase in ticks
    pub fn phase_duration(&self) -> Result<SimTime, SimulationError> {
        let hz = self.frequency_hz();
        if !(hz > 0.0) || !hz.is_finite() {
            return Err(SimulationError::InvalidClock(format!(
                "frequency must be positive, got {}",
                hz
            )));
        }
        if !(0.0..=1.0).contains(&self.duty_cycle) {
            return Err(SimulationError::InvalidClock(format!(
                "duty cycle must be within [0, 1], got {}",
                self.duty_cycle
            )));
        }

        let period = TICKS_PER_SECOND / hz;
        let fraction = if self.high {
            self.duty_cycle
        } else {
            1.0 - self.duty_cycle
        };
        Ok(((period * fraction).round() as SimTime).max(1))
    }
}

/// Per-instance state owned by stateful component kinds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuxState {
    #[default]
    None,
    FlipFlop {
        prev_clock: LogicState,
    },
    Clock(ClockState),
}

impl AuxState {
    pub fn clock(&self) -> Option<&ClockState> {
        match self {
            AuxState::Clock(clock) => Some(clock),
            _ => None,
        }
    }
}

/// Live state of one component instance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentState {
    pub input_states: Vec<SlotState>,
    pub output_states: Vec<SlotState>,
    pub input_connected: Vec<bool>,
    pub output_connected: Vec<bool>,
    pub is_changed: bool,
    pub sim_error: bool,
    pub error_message: String,
    pub aux: AuxState,
    /// Recorded input waveform of a state monitor
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub monitor_history: Vec<SlotState>,
}

impl ComponentState {
    /// All slots start low and unconnected
    pub fn new(input_count: usize, output_count: usize, aux: AuxState) -> Self {
        Self {
            input_states: vec![SlotState::default(); input_count],
            output_states: vec![SlotState::default(); output_count],
            input_connected: vec![false; input_count],
            output_connected: vec![false; output_count],
            is_changed: false,
            sim_error: false,
            error_message: String::new(),
            aux,
            monitor_history: Vec::new(),
        }
    }

    pub fn record_error(&mut self, error: &SimulationError) {
        self.sim_error = true;
        self.error_message = error.to_string();
        self.is_changed = false;
    }

    pub fn clear_error(&mut self) {
        self.sim_error = false;
        self.error_message.clear();
    }
}
