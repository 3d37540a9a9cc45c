//! Error display and classification.

use std::time::Duration;

use edgeiq_orchestrator::core::{PublishError, SchedulerError, TaskFailure};

#[test]
fn scheduler_error_messages() {
    assert_eq!(SchedulerError::DuplicateName("ml".into()).to_string(), "duplicate task name: ml");
    assert_eq!(SchedulerError::EmptyName.to_string(), "task name must not be empty");
    assert_eq!(SchedulerError::AlreadyStarted.to_string(), "scheduler already started");
    assert_eq!(SchedulerError::NoTasks.to_string(), "no tasks registered");
    assert_eq!(
        SchedulerError::InvalidConfig("broker_port must be greater than 0".into()).to_string(),
        "invalid configuration: broker_port must be greater than 0"
    );
}

#[test]
fn publish_error_messages() {
    assert_eq!(PublishError::NotConnected.to_string(), "publisher not connected");
    assert_eq!(
        PublishError::ConnectionRefused(5).to_string(),
        "connection refused by broker (code 5)"
    );
    assert_eq!(
        PublishError::Timeout(Duration::from_millis(500)).to_string(),
        "timed out after 500ms"
    );
}

#[test]
fn io_errors_convert_and_are_transient() {
    fn write() -> Result<(), PublishError> {
        Err(std::io::Error::from(std::io::ErrorKind::ConnectionReset))?;
        Ok(())
    }
    let err = write().unwrap_err();
    assert!(matches!(err, PublishError::Io(_)));
    assert!(err.is_transient());
}

#[test]
fn errors_compose_with_anyhow() {
    let err: anyhow::Error = SchedulerError::NoTasks.into();
    let err = err.context("scheduler configuration");
    assert_eq!(err.to_string(), "scheduler configuration");
    assert_eq!(err.root_cause().to_string(), "no tasks registered");

    let failure: anyhow::Error = TaskFailure::transient("sensor busy").into();
    assert_eq!(failure.to_string(), "sensor busy");
}
