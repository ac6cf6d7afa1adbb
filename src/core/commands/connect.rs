use crate::core::commands::{Command, CommandResult};
use crate::core::connections::connection_validator::ConnectionValidator;
use crate::core::execution::simulation_engine::SimulationEngine;
use crate::core::graph::ConnectionRecord;
use crate::core::types::{ComponentId, PinType};
use log::warn;
use serde_json::Value;

/// Two pin endpoints as given by the caller, in either order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub src: ComponentId,
    pub src_pin: usize,
    pub src_type: PinType,
    pub dst: ComponentId,
    pub dst_pin: usize,
    pub dst_type: PinType,
}

impl Endpoints {
    pub fn new(
        src: ComponentId,
        src_pin: usize,
        src_type: PinType,
        dst: ComponentId,
        dst_pin: usize,
        dst_type: PinType,
    ) -> Self {
        Self {
            src,
            src_pin,
            src_type,
            dst,
            dst_pin,
            dst_type,
        }
    }

    /// Output `src_pin` of `src` driving input `dst_pin` of `dst`
    pub fn output_to_input(src: ComponentId, src_pin: usize, dst: ComponentId, dst_pin: usize) -> Self {
        Self::new(src, src_pin, PinType::Output, dst, dst_pin, PinType::Input)
    }
}

fn decode_records(snapshot: &Value) -> Option<Vec<ConnectionRecord>> {
    match serde_json::from_value(snapshot.clone()) {
        Ok(records) => Some(records),
        Err(e) => {
            warn!("Corrupt connection snapshot: {}", e);
            None
        }
    }
}

/// Connect two pins.
///
/// The first execution validates against the live components. Undo stores the
/// edge as JSON and redo re-attaches that record directly.
pub struct ConnectCommand {
    endpoints: Endpoints,
    record: Option<ConnectionRecord>,
    snapshot: Option<Value>,
}

impl ConnectCommand {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            record: None,
            snapshot: None,
        }
    }
}

impl Command for ConnectCommand {
    fn execute(&mut self, engine: &mut SimulationEngine) -> bool {
        let e = self.endpoints;
        match engine.can_connect(e.src, e.src_pin, e.src_type, e.dst, e.dst_pin, e.dst_type) {
            Ok(record) if engine.attach_connection(&record, false) => {
                self.record = Some(record);
                true
            }
            Ok(_) => false,
            Err(err) => {
                warn!("Connect refused: {}", err);
                false
            }
        }
    }

    fn undo(&mut self, engine: &mut SimulationEngine) -> CommandResult {
        let Some(record) = self.record else {
            return CommandResult::None;
        };
        match serde_json::to_value(vec![record]) {
            Ok(value) => self.snapshot = Some(value),
            Err(e) => warn!("Cannot snapshot connection: {}", e),
        }
        engine.detach_connection(&record);
        CommandResult::Disconnected(vec![record])
    }

    fn redo(&mut self, engine: &mut SimulationEngine) -> bool {
        let Some(records) = self.snapshot.as_ref().and_then(decode_records) else {
            return self.execute(engine);
        };
        records
            .iter()
            .all(|record| engine.attach_connection(record, false))
    }

    fn result(&self) -> CommandResult {
        self.record.map_or(CommandResult::None, CommandResult::Connected)
    }

    fn name(&self) -> &'static str {
        "connect"
    }
}

/// Remove one or more connections
pub struct DeleteConnectionCommand {
    endpoints: Vec<Endpoints>,
    removed: Vec<ConnectionRecord>,
    snapshot: Option<Value>,
}

impl DeleteConnectionCommand {
    pub fn new(endpoints: Vec<Endpoints>) -> Self {
        Self {
            endpoints,
            removed: Vec::new(),
            snapshot: None,
        }
    }
}

impl Command for DeleteConnectionCommand {
    fn execute(&mut self, engine: &mut SimulationEngine) -> bool {
        let records: Vec<ConnectionRecord> = self
            .endpoints
            .iter()
            .filter_map(|e| {
                ConnectionValidator::normalise(e.src, e.src_pin, e.src_type, e.dst, e.dst_pin, e.dst_type).ok()
            })
            .filter(|record| engine.has_connection(record))
            .collect();

        match serde_json::to_value(&records) {
            Ok(value) => self.snapshot = Some(value),
            Err(e) => {
                warn!("Cannot snapshot connections: {}", e);
                return false;
            }
        }

        self.removed = records
            .into_iter()
            .filter(|record| engine.detach_connection(record))
            .collect();
        !self.removed.is_empty()
    }

    fn undo(&mut self, engine: &mut SimulationEngine) -> CommandResult {
        let records = self.snapshot.as_ref().and_then(decode_records).unwrap_or_default();
        let restored = records
            .into_iter()
            .filter(|record| engine.attach_connection(record, false))
            .collect();
        CommandResult::Reconnected(restored)
    }

    fn result(&self) -> CommandResult {
        CommandResult::Disconnected(self.removed.clone())
    }

    fn name(&self) -> &'static str {
        "disconnect"
    }
}
