use crate::core::connections::port_validator::PinValidator;
use crate::core::graph::{ComponentGraph, ConnectionRecord};
use crate::core::types::{ComponentId, ComponentPin, PinType};
use thiserror::Error;

/// Reasons a connection request is refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("component {0} does not exist")]
    UnknownComponent(ComponentId),

    #[error("cannot connect {0} pin to {0} pin")]
    SamePinType(PinType),

    #[error("{pin_type} pin {pin} out of range on component {component} ({count} pins)")]
    PinOutOfRange {
        component: ComponentId,
        pin_type: PinType,
        pin: usize,
        count: usize,
    },

    #[error("connection already exists")]
    AlreadyConnected,

    #[error("input pin {} on component {} is already driven by component {}", .sink.pin, .sink.component, .driver.component)]
    InputAlreadyDriven { sink: ComponentPin, driver: ComponentPin },
}

/// Centralized connection validation
pub struct ConnectionValidator;

impl ConnectionValidator {
    /// Normalise a request into driver/sink order
    pub fn normalise(
        src: ComponentId,
        src_pin: usize,
        src_type: PinType,
        dst: ComponentId,
        dst_pin: usize,
        dst_type: PinType,
    ) -> Result<ConnectionRecord, ConnectionError> {
        if src_type == dst_type {
            return Err(ConnectionError::SamePinType(src_type));
        }

        let (a, b) = (ComponentPin::new(src, src_pin), ComponentPin::new(dst, dst_pin));
        Ok(match src_type {
            PinType::Output => ConnectionRecord { driver: a, sink: b },
            PinType::Input => ConnectionRecord { driver: b, sink: a },
        })
    }

    /// Validate that `record` may be added to `graph`
    pub fn validate(graph: &ComponentGraph, record: &ConnectionRecord) -> Result<(), ConnectionError> {
        let driver = graph
            .get(record.driver.component)
            .ok_or(ConnectionError::UnknownComponent(record.driver.component))?;
        let sink = graph
            .get(record.sink.component)
            .ok_or(ConnectionError::UnknownComponent(record.sink.component))?;

        PinValidator::validate_source_pin(driver, record.driver.pin)?;
        PinValidator::validate_target_pin(sink, record.sink.pin)?;

        if graph.has_edge(record) {
            return Err(ConnectionError::AlreadyConnected);
        }

        Self::check_input_pin_collision(graph, record.sink)
    }

    /// Check if an input pin is already connected (prevents multiple drivers)
    pub fn check_input_pin_collision(graph: &ComponentGraph, sink: ComponentPin) -> Result<(), ConnectionError> {
        let existing = graph
            .get(sink.component)
            .and_then(|c| c.connections.inputs.get(sink.pin))
            .and_then(|drivers| drivers.first());

        match existing {
            Some(driver) => Err(ConnectionError::InputAlreadyDriven {
                sink,
                driver: *driver,
            }),
            None => Ok(()),
        }
    }
}
