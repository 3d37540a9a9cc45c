//! Infrastructure adapters: resource gates and broker publishers.

pub mod monitor;
pub mod publisher;

pub use monitor::{BatteryMonitor, LatencyMonitor};
pub use publisher::{InMemoryPublisher, MqttPublisher};
