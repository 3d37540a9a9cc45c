//! Orchestrator configuration structures.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::SchedulerOptions;
use crate::infra::monitor::battery::DEFAULT_SYSFS_CAPACITY;

/// Prefix of every environment variable recognised by [`OrchestratorConfig::from_env`].
pub const ENV_PREFIX: &str = "EDGEIQ_";

/// Energy gate source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySourceConfig {
    /// Simulated battery that drains on every check.
    Simulated,
    /// Linux sysfs power-supply capacity file.
    Sysfs,
    /// Level reported by the embedding application.
    Reported,
}

/// Network gate source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkSourceConfig {
    /// Simulated latency with random jitter.
    Simulated,
    /// Latency reported by the embedding application.
    Reported,
}

/// Schedule override for one task, matched by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskScheduleConfig {
    /// Task name.
    pub name: String,
    /// Lower value runs first.
    pub priority: i32,
    /// Seconds between eligible executions; 0 runs as often as the loop allows.
    pub period_secs: f64,
}

impl TaskScheduleConfig {
    /// Validate the override.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("task name must not be empty".into());
        }
        if !self.period_secs.is_finite() || self.period_secs < 0.0 {
            return Err(format!(
                "task `{}` period_secs must be a non-negative number, got {}",
                self.name, self.period_secs
            ));
        }
        Ok(())
    }

    /// Period as a duration.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(self.period_secs)
    }
}

/// Root orchestrator configuration.
///
/// Every field has a default, so a partial JSON document or an empty
/// environment yields a working configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Sleep when the queue is empty (ms).
    pub idle_backoff_ms: u64,
    /// Re-queue delay on a failed energy gate (ms).
    pub energy_backoff_ms: u64,
    /// Re-queue delay on a failed network gate (ms).
    pub network_backoff_ms: u64,
    /// Fixed gap after each task execution (ms).
    pub inter_task_gap_ms: u64,
    /// Refuse to start without registered tasks.
    pub require_tasks: bool,
    /// Energy gate floor.
    pub energy_threshold: f64,
    /// Energy gate source.
    pub energy_source: EnergySourceConfig,
    /// Starting level of the simulated battery.
    pub initial_battery: f64,
    /// Level removed from the simulated battery per gate check.
    pub battery_drain_per_check: f64,
    /// Capacity file for the sysfs source.
    pub battery_path: String,
    /// Network gate ceiling (ms).
    pub latency_limit_ms: u64,
    /// Network gate source.
    pub network_source: NetworkSourceConfig,
    /// Baseline of the simulated latency (ms).
    pub latency_base_ms: u64,
    /// Maximum jitter added to the simulated latency (ms).
    pub latency_jitter_ms: u64,
    /// Broker host.
    pub broker_host: String,
    /// Broker port.
    pub broker_port: u16,
    /// Publish topic.
    pub topic: String,
    /// MQTT client id; generated when absent.
    pub client_id: Option<String>,
    /// Broker connect timeout (ms).
    pub connect_timeout_ms: u64,
    /// Per-task schedule overrides.
    pub tasks: Vec<TaskScheduleConfig>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            idle_backoff_ms: 1_000,
            energy_backoff_ms: 2_000,
            network_backoff_ms: 2_000,
            inter_task_gap_ms: 1_000,
            require_tasks: true,
            energy_threshold: 30.0,
            energy_source: EnergySourceConfig::Simulated,
            initial_battery: 100.0,
            battery_drain_per_check: 0.5,
            battery_path: DEFAULT_SYSFS_CAPACITY.into(),
            latency_limit_ms: 200,
            network_source: NetworkSourceConfig::Simulated,
            latency_base_ms: 50,
            latency_jitter_ms: 100,
            broker_host: "localhost".into(),
            broker_port: 1883,
            topic: "edgeiq/results".into(),
            client_id: None,
            connect_timeout_ms: 5_000,
            tasks: Vec::new(),
        }
    }
}

impl OrchestratorConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.idle_backoff_ms == 0 {
            return Err("idle_backoff_ms must be greater than 0".into());
        }
        if self.energy_backoff_ms == 0 || self.network_backoff_ms == 0 {
            return Err("energy_backoff_ms and network_backoff_ms must be greater than 0".into());
        }
        if !self.energy_threshold.is_finite() {
            return Err("energy_threshold must be a finite number".into());
        }
        if !self.initial_battery.is_finite() || !self.battery_drain_per_check.is_finite() {
            return Err("battery levels must be finite numbers".into());
        }
        if self.battery_drain_per_check < 0.0 {
            return Err("battery_drain_per_check must not be negative".into());
        }
        if self.broker_host.is_empty() {
            return Err("broker_host must not be empty".into());
        }
        if self.broker_port == 0 {
            return Err("broker_port must be greater than 0".into());
        }
        if self.topic.is_empty() || self.topic.contains(['+', '#']) {
            return Err(format!("topic `{}` must be non-empty and free of wildcards", self.topic));
        }
        if self.client_id.as_deref().is_some_and(str::is_empty) {
            return Err("client_id must not be empty when set".into());
        }
        if self.connect_timeout_ms == 0 {
            return Err("connect_timeout_ms must be greater than 0".into());
        }
        let mut seen = HashSet::new();
        for task in &self.tasks {
            task.validate()?;
            if !seen.insert(task.name.as_str()) {
                return Err(format!("task `{}` configured twice", task.name));
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment.
    ///
    /// A `.env` file is loaded first if present. `EDGEIQ_CONFIG` may name a
    /// JSON file used as the base; individual `EDGEIQ_*` variables then
    /// override single fields.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from `(name, value)` pairs, as [`Self::from_env`] does.
    pub fn from_vars<I>(vars: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars
            .into_iter()
            .filter_map(|(k, v)| k.strip_prefix(ENV_PREFIX).map(|k| (k.to_owned(), v)))
            .collect();

        let mut cfg = match vars.iter().find(|(k, _)| k == "CONFIG") {
            Some((_, path)) => {
                let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
                serde_json::from_str(&text).map_err(|e| format!("parse error in {path}: {e}"))?
            }
            None => Self::default(),
        };

        for (key, value) in &vars {
            match key.as_str() {
                "CONFIG" => {}
                "IDLE_BACKOFF_MS" => cfg.idle_backoff_ms = parse_var(key, value)?,
                "ENERGY_BACKOFF_MS" => cfg.energy_backoff_ms = parse_var(key, value)?,
                "NETWORK_BACKOFF_MS" => cfg.network_backoff_ms = parse_var(key, value)?,
                "INTER_TASK_GAP_MS" => cfg.inter_task_gap_ms = parse_var(key, value)?,
                "REQUIRE_TASKS" => cfg.require_tasks = parse_var(key, value)?,
                "ENERGY_THRESHOLD" => cfg.energy_threshold = parse_var(key, value)?,
                "ENERGY_SOURCE" => cfg.energy_source = parse_enum_var(key, value)?,
                "INITIAL_BATTERY" => cfg.initial_battery = parse_var(key, value)?,
                "BATTERY_DRAIN_PER_CHECK" => cfg.battery_drain_per_check = parse_var(key, value)?,
                "BATTERY_PATH" => cfg.battery_path.clone_from(value),
                "LATENCY_LIMIT_MS" => cfg.latency_limit_ms = parse_var(key, value)?,
                "NETWORK_SOURCE" => cfg.network_source = parse_enum_var(key, value)?,
                "LATENCY_BASE_MS" => cfg.latency_base_ms = parse_var(key, value)?,
                "LATENCY_JITTER_MS" => cfg.latency_jitter_ms = parse_var(key, value)?,
                "BROKER_HOST" => cfg.broker_host.clone_from(value),
                "BROKER_PORT" => cfg.broker_port = parse_var(key, value)?,
                "TOPIC" => cfg.topic.clone_from(value),
                "CLIENT_ID" => cfg.client_id = Some(value.clone()),
                "CONNECT_TIMEOUT_MS" => cfg.connect_timeout_ms = parse_var(key, value)?,
                other => tracing::debug!(variable = %format!("{ENV_PREFIX}{other}"), "ignoring unknown variable"),
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Loop timings derived from this configuration.
    pub const fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            idle_backoff: Duration::from_millis(self.idle_backoff_ms),
            energy_backoff: Duration::from_millis(self.energy_backoff_ms),
            network_backoff: Duration::from_millis(self.network_backoff_ms),
            inter_task_gap: Duration::from_millis(self.inter_task_gap_ms),
            require_tasks: self.require_tasks,
        }
    }

    /// Schedule override for `task`, if configured.
    pub fn schedule_for(&self, task: &str) -> Option<&TaskScheduleConfig> {
        self.tasks.iter().find(|t| t.name == task)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("{ENV_PREFIX}{key}: invalid value `{value}`: {e}"))
}

fn parse_enum_var<T: DeserializeOwned>(key: &str, value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_ascii_lowercase()))
        .map_err(|e| format!("{ENV_PREFIX}{key}: invalid value `{value}`: {e}"))
}
