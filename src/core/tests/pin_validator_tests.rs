use crate::core::components::catalog::ComponentCatalog;
use crate::core::connections::connection_validator::ConnectionError;
use crate::core::connections::port_validator::PinValidator;
use crate::core::graph::ComponentInstance;
use crate::core::types::{ComponentId, ComponentType, PinType};

fn instance(component_type: ComponentType, inputs: usize, outputs: usize) -> ComponentInstance {
    let catalog = ComponentCatalog::with_builtins();
    ComponentInstance::new(ComponentId::new(), catalog.definition(&component_type), inputs, outputs)
}

#[test]
fn test_source_and_target_pins() {
    let component = instance(ComponentType::FullAdder, 3, 2);

    assert!(PinValidator::validate_source_pin(&component, 1).is_ok());
    assert!(PinValidator::validate_target_pin(&component, 2).is_ok());

    let result = PinValidator::validate_source_pin(&component, 2);
    assert_eq!(
        result,
        Err(ConnectionError::PinOutOfRange {
            component: component.id,
            pin_type: PinType::Output,
            pin: 2,
            count: 2,
        })
    );
    assert!(result.unwrap_err().to_string().contains("output pin 2 out of range"));
}

#[test]
fn test_resized_component_uses_instance_counts() {
    let component = instance(ComponentType::And, 5, 1);
    assert!(PinValidator::validate_pin(&component, 4, PinType::Input).is_ok());
    assert!(PinValidator::validate_pin(&component, 5, PinType::Input).is_err());
}

#[test]
fn test_component_without_inputs() {
    let component = instance(ComponentType::Input, 0, 1);
    assert!(PinValidator::validate_target_pin(&component, 0).is_err());
    assert!(PinValidator::validate_source_pin(&component, 0).is_ok());
}
