//! Process-level wiring: publisher lifecycle, shutdown signal, scheduler loop.

use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::builders::{add_configured_task, build_orchestrator};
use crate::config::OrchestratorConfig;
use crate::core::{AppResult, EnergyPredicate, NetworkPredicate, Publisher, Scheduler, Task};

/// A task together with its default schedule.
///
/// Schedule overrides in [`OrchestratorConfig::tasks`] take precedence.
pub struct TaskRegistration {
    /// The task.
    pub task: Box<dyn Task>,
    /// Default priority (lower runs first).
    pub priority: i32,
    /// Default period.
    pub period: Duration,
}

impl TaskRegistration {
    /// Register `task` with a default priority and period.
    pub fn new<T: Task + 'static>(task: T, priority: i32, period: Duration) -> Self {
        Self {
            task: Box::new(task),
            priority,
            period,
        }
    }
}

/// Connect `publisher`, run `scheduler` until `cancel` fires or Ctrl-C is
/// received, then disconnect the publisher.
///
/// The publisher is owned by the caller; it is disconnected here because
/// this function is the one that connected it, never by the scheduler.
pub async fn run_until_shutdown<E, N, P>(
    scheduler: &mut Scheduler,
    energy: &mut E,
    network: &mut N,
    publisher: &mut P,
    cancel: CancellationToken,
) -> AppResult<()>
where
    E: EnergyPredicate + ?Sized,
    N: NetworkPredicate + ?Sized,
    P: Publisher + ?Sized,
{
    publisher.connect().await.context("connecting publisher")?;

    let signal_cancel = cancel.clone();
    let watcher = tokio::spawn(async move {
        tokio::select! {
            _ = signal_cancel.cancelled() => {}
            res = tokio::signal::ctrl_c() => {
                match res {
                    Ok(()) => info!("shutdown signal received"),
                    Err(e) => {
                        warn!(error = %e, "cannot listen for shutdown signal");
                        signal_cancel.cancelled().await;
                    }
                }
                signal_cancel.cancel();
            }
        }
    });

    let outcome = scheduler.run(energy, network, publisher, &cancel).await;
    cancel.cancel();
    let _ = watcher.await;
    publisher.disconnect().await;
    outcome.context("scheduler configuration")
}

/// Build every component from `cfg`, register `tasks` and run until shutdown.
pub async fn run_from_config(
    cfg: &OrchestratorConfig,
    tasks: Vec<TaskRegistration>,
    cancel: CancellationToken,
) -> AppResult<()> {
    let mut orch = build_orchestrator(cfg)?;
    for reg in tasks {
        add_configured_task(&mut orch.scheduler, cfg, reg.task, reg.priority, reg.period)?;
    }
    info!(
        tasks = orch.scheduler.task_count(),
        broker = %format!("{}:{}", cfg.broker_host, cfg.broker_port),
        topic = %cfg.topic,
        "orchestrator starting"
    );
    run_until_shutdown(
        &mut orch.scheduler,
        &mut orch.energy,
        &mut orch.network,
        &mut orch.publisher,
        cancel,
    )
    .await
}
