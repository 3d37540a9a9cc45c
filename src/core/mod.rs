//! Core scheduling abstractions: tasks, gates, change filter, publisher
//! contract and the scheduler loop.

pub mod error;
pub mod events;
pub mod predicate;
pub mod publisher;
pub mod queue;
pub mod scheduler;
pub mod summarizer;
pub mod task;

pub use error::{AppResult, PublishError, SchedulerError};
pub use events::{EventKind, EventSink, InMemoryEventSink, SchedulerEvent};
pub use predicate::{AlwaysOk, EnergyPredicate, NetworkPredicate};
pub use publisher::{Envelope, Publisher};
pub use queue::{QueueEntry, Selection, TaskQueue};
pub use scheduler::{Scheduler, SchedulerOptions};
pub use summarizer::{Summarizer, Verdict};
pub use task::{to_output, FnTask, Task, TaskFailure, TaskOutput};
