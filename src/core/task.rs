//! Task contract and result payload abstraction.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Result value produced by a task.
///
/// Equality is structural: two outputs are equal when their JSON trees are
/// equal (object key order does not matter).
pub type TaskOutput = serde_json::Value;

/// Failure returned by a task invocation.
///
/// Failures are data, not panics. The scheduler logs them and re-queues the
/// task; summarizer state and the publisher are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct TaskFailure {
    /// Short human-readable reason, used for logging.
    pub reason: String,
    /// Hint that retrying later may succeed.
    pub transient: bool,
}

impl TaskFailure {
    /// Failure that may clear up on a later invocation (sensor busy, timeout).
    pub fn transient(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            transient: true,
        }
    }

    /// Failure that is not expected to clear up by itself.
    pub fn permanent(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            transient: false,
        }
    }
}

/// Convert a typed reading into a [`TaskOutput`].
pub fn to_output<T: Serialize>(value: &T) -> Result<TaskOutput, TaskFailure> {
    serde_json::to_value(value).map_err(|e| TaskFailure::permanent(format!("unserializable output: {e}")))
}

/// A named, independently re-runnable unit of sensing or inference work.
///
/// The scheduler never inspects the output; it only forwards it through the
/// summarizer to the publisher.
///
/// # Blocking
///
/// The scheduler runs a single worker and imposes no per-task timeout. A task
/// whose `run` never completes stalls the whole loop, so long or blocking
/// work should bound itself (for instance with `tokio::time::timeout` or by
/// moving it onto `tokio::task::spawn_blocking`).
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use edgeiq_orchestrator::core::{Task, TaskFailure, TaskOutput};
///
/// struct TempTask;
///
/// #[async_trait]
/// impl Task for TempTask {
///     fn name(&self) -> &str {
///         "temperature"
///     }
///
///     async fn run(&mut self) -> Result<TaskOutput, TaskFailure> {
///         Ok(serde_json::json!({ "temperature": 25.5 }))
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send {
    /// Stable, non-empty name, unique within a scheduler.
    fn name(&self) -> &str;

    /// Execute one invocation of the task.
    async fn run(&mut self) -> Result<TaskOutput, TaskFailure>;
}

#[async_trait]
impl<T> Task for Box<T>
where
    T: Task + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn run(&mut self) -> Result<TaskOutput, TaskFailure> {
        (**self).run().await
    }
}

/// Task built from a name and a closure.
pub struct FnTask<F> {
    name: String,
    f: F,
}

impl<F> FnTask<F>
where
    F: FnMut() -> Result<TaskOutput, TaskFailure> + Send,
{
    /// Wrap `f` as a task called `name`.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

#[async_trait]
impl<F> Task for FnTask<F>
where
    F: FnMut() -> Result<TaskOutput, TaskFailure> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self) -> Result<TaskOutput, TaskFailure> {
        (self.f)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Reading {
        prediction: &'static str,
        confidence: f64,
    }

    #[test]
    fn typed_reading_converts_to_output() {
        let out = to_output(&Reading {
            prediction: "normal",
            confidence: 0.91,
        })
        .unwrap();
        assert_eq!(out, json!({ "confidence": 0.91, "prediction": "normal" }));
    }

    #[test]
    fn failure_constructors_set_hint() {
        assert!(TaskFailure::transient("busy").transient);
        assert!(!TaskFailure::permanent("gone").transient);
        assert_eq!(TaskFailure::transient("sensor busy").to_string(), "sensor busy");
    }

    #[tokio::test]
    async fn fn_task_runs_closure() {
        let mut calls = 0;
        let mut task = FnTask::new("counter", move || {
            calls += 1;
            Ok(json!(calls))
        });
        assert_eq!(task.name(), "counter");
        assert_eq!(task.run().await.unwrap(), json!(1));
        assert_eq!(task.run().await.unwrap(), json!(2));
    }
}
