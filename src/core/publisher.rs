//! Publish envelope and publisher contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{PublishError, TaskOutput};
use crate::util::clock::unix_timestamp;

/// Record delivered to the broker for every emitted result.
///
/// Wire form: `{"task": "<name>", "result": <json>, "timestamp": <secs>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Name of the task that produced the result.
    pub task: String,
    /// The task output, in its natural JSON mapping.
    pub result: TaskOutput,
    /// Wall-clock publish time, fractional seconds since the Unix epoch.
    pub timestamp: f64,
}

impl Envelope {
    /// Build an envelope with an explicit timestamp.
    pub fn new(task: impl Into<String>, result: TaskOutput, timestamp: f64) -> Self {
        Self {
            task: task.into(),
            result,
            timestamp,
        }
    }

    /// Build an envelope stamped with the current wall clock.
    pub fn stamped(task: impl Into<String>, result: TaskOutput) -> Self {
        Self::new(task, result, unix_timestamp())
    }

    /// Encode as a UTF-8 JSON document.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Delivers accepted results to the upstream broker.
///
/// The caller opens exactly one publisher before starting the scheduler and
/// closes it after the loop returns. `publish` is fire-and-forget from the
/// scheduler's point of view: failures are logged and the loop moves on.
/// Implementations may buffer or retry transient failures internally.
///
/// # Blocking
///
/// A publish is never raced against cancellation, so an in-flight envelope
/// is not cut off mid-write. Each call therefore delays shutdown by however
/// long it takes; implementations that reconnect internally should bound
/// that work (`MqttPublisher` opens at most one session per call, limited
/// by its `connect_timeout`).
#[async_trait]
pub trait Publisher: Send {
    /// Open the broker connection.
    async fn connect(&mut self) -> Result<(), PublishError>;

    /// Deliver one envelope.
    async fn publish(&mut self, envelope: &Envelope) -> Result<(), PublishError>;

    /// Close the broker connection. Safe to call when not connected.
    async fn disconnect(&mut self);
}
