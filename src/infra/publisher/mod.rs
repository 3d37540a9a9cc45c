//! Publisher backends.

pub mod memory;
pub mod mqtt;

pub use memory::InMemoryPublisher;
pub use mqtt::{MqttOptions, MqttPublisher};
