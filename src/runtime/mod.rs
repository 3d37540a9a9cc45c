//! Runtime wiring for running the orchestrator inside a process.

pub mod launcher;

pub use launcher::{run_from_config, run_until_shutdown, TaskRegistration};
