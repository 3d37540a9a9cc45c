//! Scheduler lifecycle events.
//!
//! Every step of the control loop is logged through `tracing`; an optional
//! [`EventSink`] receives the same steps as data, for tests and embedding
//! applications that want to observe the loop without parsing logs.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Kind of lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Task invocation is about to start.
    Started,
    /// Task returned a failure.
    Failed,
    /// Energy gate rejected the task.
    GatedEnergy,
    /// Network gate rejected the task.
    GatedNetwork,
    /// Summarizer classified the result as changed.
    Emitted,
    /// Summarizer classified the result as unchanged.
    Suppressed,
    /// Publisher accepted the envelope.
    Published,
    /// Publisher returned an error.
    PublishFailed,
}

impl EventKind {
    /// Stable snake-case label, matching the log event names.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "task_started",
            Self::Failed => "task_failed",
            Self::GatedEnergy => "gated_energy",
            Self::GatedNetwork => "gated_network",
            Self::Emitted => "emitted",
            Self::Suppressed => "suppressed",
            Self::Published => "published",
            Self::PublishFailed => "publish_failed",
        }
    }
}

/// One lifecycle step of one task.
#[derive(Debug, Clone)]
pub struct SchedulerEvent {
    /// Task name.
    pub task: String,
    /// What happened.
    pub kind: EventKind,
    /// Monotonic time of the step.
    pub at: Instant,
    /// Failure or error text, when there is one.
    pub detail: Option<String>,
}

/// Event sink abstraction.
pub trait EventSink: Send {
    /// Record an event.
    fn record(&mut self, event: SchedulerEvent);
}

/// Bounded in-memory sink. Clones share the same buffer.
#[derive(Clone)]
pub struct InMemoryEventSink {
    events: Arc<Mutex<VecDeque<SchedulerEvent>>>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a sink keeping at most `max_events` (oldest dropped first).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Snapshot of stored events.
    pub fn events(&self) -> Vec<SchedulerEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored events of one kind, in order.
    pub fn of_kind(&self, kind: EventKind) -> Vec<SchedulerEvent> {
        self.events.lock().iter().filter(|e| e.kind == kind).cloned().collect()
    }

    /// Names of tasks that started, in invocation order.
    pub fn started_order(&self) -> Vec<String> {
        self.of_kind(EventKind::Started).into_iter().map(|e| e.task).collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&mut self, event: SchedulerEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}
