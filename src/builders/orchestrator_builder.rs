//! Builders to construct the scheduler, gates and publisher from configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{EnergySourceConfig, NetworkSourceConfig, OrchestratorConfig};
use crate::core::{Scheduler, SchedulerError, Task};
use crate::infra::monitor::{BatteryMonitor, EnergyHandle, LatencyHandle, LatencyMonitor};
use crate::infra::publisher::mqtt::generate_client_id;
use crate::infra::publisher::{MqttOptions, MqttPublisher};

/// Components assembled from one configuration.
pub struct Orchestrator {
    /// Scheduler with no tasks registered yet.
    pub scheduler: Scheduler,
    /// Energy gate.
    pub energy: BatteryMonitor,
    /// Network gate.
    pub network: LatencyMonitor,
    /// Broker publisher, not yet connected.
    pub publisher: MqttPublisher,
    /// Write side of the energy gate when its source is `reported`.
    pub energy_handle: Option<EnergyHandle>,
    /// Write side of the network gate when its source is `reported`.
    pub latency_handle: Option<LatencyHandle>,
}

/// Validate `cfg` and build every component.
pub fn build_orchestrator(cfg: &OrchestratorConfig) -> Result<Orchestrator, SchedulerError> {
    let scheduler = build_scheduler(cfg)?;
    let (energy, energy_handle) = build_energy_monitor(cfg);
    let (network, latency_handle) = build_latency_monitor(cfg);
    Ok(Orchestrator {
        scheduler,
        energy,
        network,
        publisher: build_publisher(cfg),
        energy_handle,
        latency_handle,
    })
}

/// Build an empty scheduler with the configured timings.
pub fn build_scheduler(cfg: &OrchestratorConfig) -> Result<Scheduler, SchedulerError> {
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;
    Ok(Scheduler::new(cfg.scheduler_options()))
}

/// Build the energy gate; the handle is present for the `reported` source.
pub fn build_energy_monitor(cfg: &OrchestratorConfig) -> (BatteryMonitor, Option<EnergyHandle>) {
    match cfg.energy_source {
        EnergySourceConfig::Simulated => (
            BatteryMonitor::simulated(cfg.initial_battery, cfg.battery_drain_per_check, cfg.energy_threshold),
            None,
        ),
        EnergySourceConfig::Sysfs => (
            BatteryMonitor::sysfs(PathBuf::from(&cfg.battery_path), cfg.energy_threshold),
            None,
        ),
        EnergySourceConfig::Reported => {
            let handle = EnergyHandle::new(cfg.initial_battery);
            (BatteryMonitor::reported(handle.clone(), cfg.energy_threshold), Some(handle))
        }
    }
}

/// Build the network gate; the handle is present for the `reported` source.
pub fn build_latency_monitor(cfg: &OrchestratorConfig) -> (LatencyMonitor, Option<LatencyHandle>) {
    match cfg.network_source {
        NetworkSourceConfig::Simulated => (
            LatencyMonitor::simulated(cfg.latency_base_ms, cfg.latency_jitter_ms, cfg.latency_limit_ms),
            None,
        ),
        NetworkSourceConfig::Reported => {
            let handle = LatencyHandle::new(cfg.latency_base_ms);
            (LatencyMonitor::reported(handle.clone(), cfg.latency_limit_ms), Some(handle))
        }
    }
}

/// Build the broker publisher.
pub fn build_publisher(cfg: &OrchestratorConfig) -> MqttPublisher {
    let options = MqttOptions {
        host: cfg.broker_host.clone(),
        port: cfg.broker_port,
        topic: cfg.topic.clone(),
        client_id: cfg.client_id.clone().unwrap_or_else(generate_client_id),
        keep_alive_secs: 0,
        connect_timeout: Duration::from_millis(cfg.connect_timeout_ms),
    };
    MqttPublisher::new(options)
}

/// Register `task`, taking priority and period from the configuration when
/// it has an entry for the task's name and from the defaults otherwise.
pub fn add_configured_task<T>(
    scheduler: &mut Scheduler,
    cfg: &OrchestratorConfig,
    task: T,
    default_priority: i32,
    default_period: Duration,
) -> Result<(), SchedulerError>
where
    T: Task + 'static,
{
    let (priority, period) = cfg
        .schedule_for(task.name())
        .map_or((default_priority, default_period), |s| (s.priority, s.period()));
    scheduler.add_task(task, priority, period)
}
