//! Configuration models for the scheduler, gates and broker.

pub mod orchestrator;

pub use orchestrator::{EnergySourceConfig, NetworkSourceConfig, OrchestratorConfig, TaskScheduleConfig};
