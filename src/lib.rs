//! # EdgeIQ Orchestrator
//!
//! A long-running task orchestrator for resource-constrained edge nodes.
//!
//! The orchestrator periodically executes a mixed set of sensing and
//! inference tasks, suppresses results that did not change since the last
//! emitted one, and forwards the meaningful ones to an upstream broker. Two
//! live gates, battery budget and network quality, can defer a task when
//! conditions are unfavourable.
//!
//! ## Pipeline
//!
//! Each iteration of the single-worker loop:
//!
//! 1. selects the highest-priority eligible task (FIFO among equal priorities),
//! 2. consults the [`core::EnergyPredicate`] and [`core::NetworkPredicate`] gates,
//!    re-queueing the task with a backoff if either rejects it,
//! 3. runs the task,
//! 4. feeds the result to the [`core::Summarizer`],
//! 5. publishes changed results as an [`core::Envelope`] through a [`core::Publisher`],
//! 6. re-queues the task for its next period.
//!
//! ## Key Features
//!
//! - **Deterministic ordering**: `(priority, sequence)` with FIFO tie-breaking
//! - **Graceful degradation**: energy and network gates defer rather than fail
//! - **Change filtering**: N identical consecutive results cause one publish
//! - **Cooperative cancellation**: every sleep is a cancellation point
//! - **MQTT forwarding**: minimal 3.1.1 QoS 0 publisher, or an in-memory one for tests
//!
//! ```rust,ignore
//! use edgeiq_orchestrator::config::OrchestratorConfig;
//! use edgeiq_orchestrator::core::FnTask;
//! use edgeiq_orchestrator::runtime::{run_from_config, TaskRegistration};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! edgeiq_orchestrator::util::init_tracing("info");
//! let cfg = OrchestratorConfig::from_env()?;
//! let tasks = vec![
//!     TaskRegistration::new(temp_task, 2, Duration::from_secs(1)),
//!     TaskRegistration::new(ml_task, 5, Duration::from_secs(1)),
//! ];
//! run_from_config(&cfg, tasks, CancellationToken::new()).await?;
//! ```
//!
//! For complete scenarios, see `tests/scheduler_scenarios_test.rs`.

#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: tasks, gates, summarizer, publisher contract.
pub mod core;
/// Configuration models for the scheduler, gates and broker.
pub mod config;
/// Builders to construct orchestrator components from configuration.
pub mod builders;
/// Infrastructure adapters for gates and broker publishers.
pub mod infra;
/// Runtime wiring (publisher lifecycle, shutdown signal).
pub mod runtime;
/// Shared utilities.
pub mod util;
