//! Single-worker scheduler driving the gate → run → summarize → publish loop.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{
    EnergyPredicate, Envelope, EventKind, EventSink, NetworkPredicate, Publisher, QueueEntry, SchedulerError,
    SchedulerEvent, Selection, Summarizer, Task, TaskQueue, Verdict,
};

/// Default sleep when the queue is empty.
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_secs(1);
/// Default re-queue delay after a failed energy gate.
pub const DEFAULT_ENERGY_BACKOFF: Duration = Duration::from_secs(2);
/// Default re-queue delay after a failed network gate.
pub const DEFAULT_NETWORK_BACKOFF: Duration = Duration::from_secs(2);
/// Default gap after each task execution.
pub const DEFAULT_INTER_TASK_GAP: Duration = Duration::from_secs(1);

/// Timing and start-up options for the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Sleep when the queue is empty.
    pub idle_backoff: Duration,
    /// Re-queue delay when the energy gate rejects a task.
    pub energy_backoff: Duration,
    /// Re-queue delay when the network gate rejects a task.
    pub network_backoff: Duration,
    /// Fixed gap after each successful task execution.
    pub inter_task_gap: Duration,
    /// Fail `run` with [`SchedulerError::NoTasks`] when nothing is registered.
    pub require_tasks: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            idle_backoff: DEFAULT_IDLE_BACKOFF,
            energy_backoff: DEFAULT_ENERGY_BACKOFF,
            network_backoff: DEFAULT_NETWORK_BACKOFF,
            inter_task_gap: DEFAULT_INTER_TASK_GAP,
            require_tasks: true,
        }
    }
}

struct TaskSlot {
    task: Box<dyn Task>,
    period: Duration,
}

/// Priority scheduler for a closed set of periodic tasks.
///
/// One worker pops the highest-precedence eligible task, consults the energy
/// and network gates, runs the task, threads the result through the
/// [`Summarizer`] and hands changed results to the [`Publisher`]. Tasks cycle
/// indefinitely; `run` only returns on cancellation.
///
/// The scheduler owns its queue and summarizer state. It borrows the gates
/// and the publisher for the duration of `run` and never disconnects the
/// publisher.
///
/// # Example
///
/// ```rust,ignore
/// let mut scheduler = Scheduler::new(SchedulerOptions::default());
/// scheduler.add_task(temp_task, 2, Duration::from_secs(1))?;
/// scheduler.add_task(ml_task, 5, Duration::from_secs(1))?;
///
/// publisher.connect().await?;
/// scheduler.run(&mut battery, &mut latency, &mut publisher, &cancel).await?;
/// publisher.disconnect().await;
/// ```
pub struct Scheduler {
    options: SchedulerOptions,
    slots: Vec<TaskSlot>,
    queue: TaskQueue<usize>,
    summarizer: Summarizer,
    events: Option<Box<dyn EventSink>>,
    started: bool,
}

impl Scheduler {
    /// Create a scheduler with no tasks.
    pub fn new(options: SchedulerOptions) -> Self {
        Self {
            options,
            slots: Vec::new(),
            queue: TaskQueue::new(),
            summarizer: Summarizer::new(),
            events: None,
            started: false,
        }
    }

    /// Attach an event sink.
    #[must_use]
    pub fn with_events(mut self, sink: Box<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    /// Register a task. It becomes eligible immediately.
    ///
    /// Lower `priority` values run first. A `period` of zero lets the task
    /// run on every loop iteration, still separated by the inter-task gap.
    pub fn add_task<T>(&mut self, task: T, priority: i32, period: Duration) -> Result<(), SchedulerError>
    where
        T: Task + 'static,
    {
        if self.started {
            return Err(SchedulerError::AlreadyStarted);
        }
        let name = task.name().to_owned();
        if name.is_empty() {
            return Err(SchedulerError::EmptyName);
        }
        if self.queue.contains(&name) {
            return Err(SchedulerError::DuplicateName(name));
        }
        let slot = self.slots.len();
        self.queue.push(&name, slot, priority, Instant::now());
        self.slots.push(TaskSlot {
            task: Box::new(task),
            period,
        });
        debug!(task = %name, priority, period_ms = period.as_millis(), "task registered");
        Ok(())
    }

    /// Loop options.
    pub const fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Number of registered tasks.
    pub fn task_count(&self) -> usize {
        self.slots.len()
    }

    /// Whether `run` has been entered.
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Queued task names in `(priority, sequence)` order.
    pub fn queued_names(&self) -> Vec<&str> {
        self.queue.names_in_order()
    }

    /// Change-filter state.
    pub const fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// Drop the remembered result for `task`, so its next result is published.
    pub fn forget(&mut self, task: &str) {
        self.summarizer.forget(task);
    }

    /// Drive the control loop until `cancel` is signalled.
    ///
    /// Every sleep is a cancellation point. A task invocation that is already
    /// in flight completes and its result is summarized and published before
    /// the loop returns.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::NoTasks`] when no task is registered and
    /// [`SchedulerOptions::require_tasks`] is set. Nothing else escapes the
    /// loop: task failures, gate rejections and publish errors are logged
    /// and recovered in place.
    pub async fn run<E, N, P>(
        &mut self,
        energy: &mut E,
        network: &mut N,
        publisher: &mut P,
        cancel: &CancellationToken,
    ) -> Result<(), SchedulerError>
    where
        E: EnergyPredicate + ?Sized,
        N: NetworkPredicate + ?Sized,
        P: Publisher + ?Sized,
    {
        if self.options.require_tasks && self.slots.is_empty() {
            return Err(SchedulerError::NoTasks);
        }
        self.started = true;
        info!(tasks = self.slots.len(), "scheduler started");

        while !cancel.is_cancelled() {
            let entry = match self.queue.select(Instant::now()) {
                Selection::Ready(entry) => entry,
                Selection::WaitUntil(at) => {
                    if !sleep_until_or_cancel(at, cancel).await {
                        break;
                    }
                    continue;
                }
                Selection::Empty => {
                    debug!(backoff_ms = self.options.idle_backoff.as_millis(), "queue empty");
                    if !sleep_until_or_cancel(Instant::now() + self.options.idle_backoff, cancel).await {
                        break;
                    }
                    continue;
                }
            };

            if !EnergyPredicate::ok(energy) {
                debug!(task = %entry.name, "gated_energy");
                self.record(&entry.name, EventKind::GatedEnergy, None);
                let at = Instant::now() + self.options.energy_backoff;
                self.requeue(entry, at);
                if !yield_or_cancel(cancel).await {
                    break;
                }
                continue;
            }
            if !NetworkPredicate::ok(network) {
                debug!(task = %entry.name, "gated_network");
                self.record(&entry.name, EventKind::GatedNetwork, None);
                let at = Instant::now() + self.options.network_backoff;
                self.requeue(entry, at);
                if !yield_or_cancel(cancel).await {
                    break;
                }
                continue;
            }
            if cancel.is_cancelled() {
                let at = entry.eligible_at;
                self.requeue(entry, at);
                break;
            }

            let period = self.slots[entry.item].period;
            debug!(task = %entry.name, priority = entry.priority, "task_started");
            self.record(&entry.name, EventKind::Started, None);
            let outcome = self.slots[entry.item].task.run().await;

            match outcome {
                Err(failure) => {
                    warn!(
                        task = %entry.name,
                        reason = %failure.reason,
                        transient = failure.transient,
                        "task_failed"
                    );
                    self.record(&entry.name, EventKind::Failed, Some(failure.reason));
                    let at = Instant::now() + period;
                    self.requeue(entry, at);
                    if !yield_or_cancel(cancel).await {
                        break;
                    }
                    continue;
                }
                Ok(result) => match self.summarizer.summarize(&entry.name, result) {
                    Verdict::Emit(result) => {
                        debug!(task = %entry.name, "emitted");
                        self.record(&entry.name, EventKind::Emitted, None);
                        self.deliver(publisher, Envelope::stamped(entry.name.clone(), result))
                            .await;
                    }
                    Verdict::Suppress => {
                        debug!(task = %entry.name, "suppressed");
                        self.record(&entry.name, EventKind::Suppressed, None);
                    }
                },
            }

            let proceed = if self.options.inter_task_gap.is_zero() {
                yield_or_cancel(cancel).await
            } else {
                sleep_until_or_cancel(Instant::now() + self.options.inter_task_gap, cancel).await
            };
            let at = Instant::now() + period;
            self.requeue(entry, at);
            if !proceed {
                break;
            }
        }

        info!("scheduler stopped");
        Ok(())
    }

    async fn deliver<P>(&mut self, publisher: &mut P, envelope: Envelope)
    where
        P: Publisher + ?Sized,
    {
        match publisher.publish(&envelope).await {
            Ok(()) => {
                debug!(task = %envelope.task, "published");
                self.record(&envelope.task, EventKind::Published, None);
            }
            Err(e) => {
                warn!(
                    task = %envelope.task,
                    reason = %e,
                    transient = e.is_transient(),
                    "publish_failed"
                );
                self.record(&envelope.task, EventKind::PublishFailed, Some(e.to_string()));
            }
        }
    }

    fn requeue(&mut self, entry: QueueEntry<usize>, eligible_at: Instant) {
        let inserted = self.queue.push(&entry.name, entry.item, entry.priority, eligible_at);
        debug_assert!(inserted, "task {} queued twice", entry.name);
    }

    fn record(&mut self, task: &str, kind: EventKind, detail: Option<String>) {
        if let Some(sink) = self.events.as_mut() {
            sink.record(SchedulerEvent {
                task: task.to_owned(),
                kind,
                at: Instant::now(),
                detail,
            });
        }
    }
}

/// Give other tasks on the runtime a turn; returns `false` if cancelled.
///
/// Every path back to the top of the loop passes through a suspension
/// point, so zero periods and zero backoffs cannot spin the worker.
async fn yield_or_cancel(cancel: &CancellationToken) -> bool {
    tokio::task::yield_now().await;
    !cancel.is_cancelled()
}

/// Sleep until `deadline`; returns `false` if cancelled first.
async fn sleep_until_or_cancel(deadline: Instant, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep_until(deadline) => true,
    }
}
