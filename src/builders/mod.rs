//! Builders to construct orchestrator components from configuration.

pub mod orchestrator_builder;

pub use orchestrator_builder::{
    add_configured_task, build_energy_monitor, build_latency_monitor, build_orchestrator, build_publisher,
    build_scheduler, Orchestrator,
};
