//! Error types for scheduler and publisher operations.

use std::time::Duration;

use thiserror::Error;

/// Configuration errors raised synchronously by the scheduler.
///
/// These are the only errors that surface out of the core; everything that
/// happens inside the control loop is recovered in-loop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// A task with this name is already registered.
    #[error("duplicate task name: {0}")]
    DuplicateName(String),
    /// Task names must be non-empty.
    #[error("task name must not be empty")]
    EmptyName,
    /// Tasks cannot be registered once the loop has started.
    #[error("scheduler already started")]
    AlreadyStarted,
    /// `run` was called without any registered task.
    #[error("no tasks registered")]
    NoTasks,
    /// Configuration values failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors produced by publisher backends.
#[derive(Debug, Error)]
pub enum PublishError {
    /// `publish` was called before `connect` succeeded.
    #[error("publisher not connected")]
    NotConnected,
    /// Socket-level failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Envelope could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
    /// Broker refused the connection with the given return code.
    #[error("connection refused by broker (code {0})")]
    ConnectionRefused(u8),
    /// Broker answered with something that does not follow the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Operation did not finish in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl PublishError {
    /// Whether retrying the same operation later may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::NotConnected | Self::Io(_) | Self::Timeout(_))
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
