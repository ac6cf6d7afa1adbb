use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulation time in nanosecond ticks
pub type SimTime = u64;

/// Ticks in one simulated second
pub const TICKS_PER_SECOND: f64 = 1e9;

/// Process-unique identifier of a component instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Sentinel returned when no component could be created
    pub const NULL: ComponentId = ComponentId(0);

    /// Create a new random identifier
    pub fn new() -> Self {
        loop {
            let (high, low) = uuid::Uuid::new_v4().as_u64_pair();
            let raw = high ^ low;
            if raw != 0 {
                return Self(raw);
            }
        }
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value carried by a single pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicState {
    /// Also the value read by a floating input
    #[default]
    Low,
    High,
    Unknown,
    HighZ,
}

impl LogicState {
    pub fn from_bool(value: bool) -> Self {
        if value {
            LogicState::High
        } else {
            LogicState::Low
        }
    }

    pub fn is_high(&self) -> bool {
        *self == LogicState::High
    }

    /// Logical complement; undriven or unknown values have no defined complement
    pub fn complement(&self) -> Self {
        match self {
            LogicState::Low => LogicState::High,
            LogicState::High => LogicState::Low,
            LogicState::Unknown | LogicState::HighZ => LogicState::Unknown,
        }
    }
}

impl From<bool> for LogicState {
    fn from(value: bool) -> Self {
        LogicState::from_bool(value)
    }
}

impl fmt::Display for LogicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            LogicState::Low => "0",
            LogicState::High => "1",
            LogicState::Unknown => "X",
            LogicState::HighZ => "Z",
        };
        f.write_str(symbol)
    }
}

/// State of one slot and when it last changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotState {
    pub state: LogicState,
    pub last_change_time: SimTime,
}

impl SlotState {
    pub fn new(state: LogicState, last_change_time: SimTime) -> Self {
        Self {
            state,
            last_change_time,
        }
    }
}

/// Direction of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinType {
    Input,
    Output,
}

impl PinType {
    pub fn opposite(&self) -> Self {
        match self {
            PinType::Input => PinType::Output,
            PinType::Output => PinType::Input,
        }
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinType::Input => f.write_str("input"),
            PinType::Output => f.write_str("output"),
        }
    }
}

/// A pin on a remote component, as seen from the other end of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentPin {
    #[serde(rename = "target_id")]
    pub component: ComponentId,
    #[serde(rename = "pin_index")]
    pub pin: usize,
}

impl ComponentPin {
    pub fn new(component: ComponentId, pin: usize) -> Self {
        Self { component, pin }
    }
}

/// Kind of a component definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Input,
    Output,
    Clock,
    StateMonitor,
    SevenSegmentDriver,
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
    Not,
    TriStateBuffer,
    TriStateBuffer4,
    TriStateBuffer8,
    FlipFlopJk,
    FlipFlopSr,
    FlipFlopD,
    FlipFlopT,
    HalfAdder,
    FullAdder,
    HalfSubtractor,
    FullSubtractor,
    Mux2To1,
    Mux4To1,
    Decoder2To4,
    Demux1To4,
    Encoder4To2,
    PriorityEncoder4To2,
    Comparator1Bit,
    Comparator2Bit,
    /// Externally registered definition, keyed by name
    Custom(String),
}

impl ComponentType {
    /// Parse a type from its snake case name, falling back to a custom type
    pub fn parse(name: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(name.to_ascii_lowercase()))
            .unwrap_or_else(|_| ComponentType::Custom(name.to_string()))
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentType::Custom(name) => write!(f, "custom:{}", name),
            other => match serde_json::to_value(other) {
                Ok(serde_json::Value::String(name)) => f.write_str(&name),
                _ => write!(f, "{:?}", other),
            },
        }
    }
}
