use crate::core::connections::connection_validator::ConnectionError;
use crate::core::graph::ComponentInstance;
use crate::core::types::PinType;

/// Pin range checks for component instances
pub struct PinValidator;

impl PinValidator {
    /// Validate that `pin` exists on the `pin_type` side of `component`
    pub fn validate_pin(
        component: &ComponentInstance,
        pin: usize,
        pin_type: PinType,
    ) -> Result<(), ConnectionError> {
        let count = match pin_type {
            PinType::Input => component.input_count(),
            PinType::Output => component.output_count(),
        };

        if pin >= count {
            return Err(ConnectionError::PinOutOfRange {
                component: component.id,
                pin_type,
                pin,
                count,
            });
        }
        Ok(())
    }

    /// Validate that an output pin exists to drive a connection
    pub fn validate_source_pin(component: &ComponentInstance, pin: usize) -> Result<(), ConnectionError> {
        Self::validate_pin(component, pin, PinType::Output)
    }

    /// Validate that an input pin exists to receive a connection
    pub fn validate_target_pin(component: &ComponentInstance, pin: usize) -> Result<(), ConnectionError> {
        Self::validate_pin(component, pin, PinType::Input)
    }
}
