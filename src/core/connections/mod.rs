pub mod connection_validator;
pub mod port_validator;

pub use connection_validator::{ConnectionError, ConnectionValidator};
pub use port_validator::PinValidator;
