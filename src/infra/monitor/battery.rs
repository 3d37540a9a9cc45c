//! Battery-level energy gate.
//!
//! [`BatteryMonitor`] compares a battery level against a threshold. The level
//! comes from one of three sources:
//!
//! | Source | Level |
//! |--------|-------|
//! | [`BatterySource::Simulated`] | starts at an initial level and drains on every check |
//! | [`BatterySource::Sysfs`] | read from a Linux power-supply `capacity` file |
//! | [`BatterySource::Reported`] | written by an external poller through an [`EnergyHandle`] |
//!
//! **Side effect:** with the simulated source every call to
//! [`EnergyPredicate::ok`] advances the drain model, so each gate evaluation
//! consumes budget. Sysfs and reported sources have no side effects.
//!
//! Units are opaque; the defaults treat the level as a percentage.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::EnergyPredicate;

/// Conventional location of the first battery's charge percentage on Linux.
pub const DEFAULT_SYSFS_CAPACITY: &str = "/sys/class/power_supply/BAT0/capacity";

/// Shared battery level written by an external sensor poller.
#[derive(Debug, Clone)]
pub struct EnergyHandle(Arc<AtomicU64>);

impl EnergyHandle {
    /// Create a handle holding `level`.
    pub fn new(level: f64) -> Self {
        Self(Arc::new(AtomicU64::new(level.to_bits())))
    }

    /// Publish a fresh reading.
    pub fn set(&self, level: f64) {
        self.0.store(level.to_bits(), Ordering::Release);
    }

    /// Latest reading.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }
}

/// Where the battery level comes from.
#[derive(Debug, Clone)]
pub enum BatterySource {
    /// Level drains by `drain_per_check` on every gate evaluation, floored at 0.
    Simulated {
        /// Current simulated level.
        level: f64,
        /// Amount removed per check.
        drain_per_check: f64,
    },
    /// Level read from a sysfs file. An unreadable file means mains power.
    Sysfs(PathBuf),
    /// Level supplied by the embedding application.
    Reported(EnergyHandle),
}

/// Energy gate passing while the battery level is at or above a threshold.
#[derive(Debug, Clone)]
pub struct BatteryMonitor {
    source: BatterySource,
    threshold: f64,
    last_ok: Option<bool>,
}

impl BatteryMonitor {
    /// Create a monitor over `source`.
    pub const fn new(source: BatterySource, threshold: f64) -> Self {
        Self {
            source,
            threshold,
            last_ok: None,
        }
    }

    /// Simulated battery starting at `initial` and losing `drain_per_check` per check.
    pub const fn simulated(initial: f64, drain_per_check: f64, threshold: f64) -> Self {
        Self::new(
            BatterySource::Simulated {
                level: initial,
                drain_per_check,
            },
            threshold,
        )
    }

    /// Battery read from a sysfs capacity file.
    pub fn sysfs(path: impl Into<PathBuf>, threshold: f64) -> Self {
        Self::new(BatterySource::Sysfs(path.into()), threshold)
    }

    /// Battery level fed through `handle`.
    pub const fn reported(handle: EnergyHandle, threshold: f64) -> Self {
        Self::new(BatterySource::Reported(handle), threshold)
    }

    /// Configured floor.
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Current level without side effects. `None` when no battery is readable.
    pub fn level(&self) -> Option<f64> {
        match &self.source {
            BatterySource::Simulated { level, .. } => Some(*level),
            BatterySource::Sysfs(path) => read_capacity(path),
            BatterySource::Reported(handle) => Some(handle.get()),
        }
    }

    fn observe(&mut self) -> Option<f64> {
        let level = self.level();
        if let BatterySource::Simulated {
            level: current,
            drain_per_check,
        } = &mut self.source
        {
            *current = (*current - *drain_per_check).max(0.0);
        }
        level
    }
}

impl EnergyPredicate for BatteryMonitor {
    fn ok(&mut self) -> bool {
        let Some(level) = self.observe() else {
            debug!("no battery reading; assuming mains power");
            return true;
        };
        let ok = level >= self.threshold;
        if self.last_ok != Some(ok) {
            if ok {
                info!(level, threshold = self.threshold, "energy budget available");
            } else {
                warn!(level, threshold = self.threshold, "energy budget below threshold");
            }
            self.last_ok = Some(ok);
        }
        ok
    }
}

fn read_capacity(path: &Path) -> Option<f64> {
    std::fs::read_to_string(path).ok()?.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_drain_crosses_threshold() {
        let mut m = BatteryMonitor::simulated(32.0, 1.0, 30.0);
        assert!(m.ok()); // 32
        assert!(m.ok()); // 31
        assert!(m.ok()); // 30
        assert!(!m.ok()); // 29
        assert_eq!(m.level(), Some(28.0));
    }

    #[test]
    fn simulated_drain_floors_at_zero() {
        let mut m = BatteryMonitor::simulated(0.5, 1.0, 0.0);
        assert!(m.ok());
        assert_eq!(m.level(), Some(0.0));
        assert!(m.ok());
    }

    #[test]
    fn reported_level_follows_handle() {
        let handle = EnergyHandle::new(80.0);
        let mut m = BatteryMonitor::reported(handle.clone(), 30.0);
        assert!(m.ok());
        handle.set(12.5);
        assert!(!m.ok());
        assert_eq!(m.level(), Some(12.5));
        handle.set(30.0);
        assert!(m.ok());
    }

    #[test]
    fn sysfs_reads_capacity_file() {
        let path = std::env::temp_dir().join(format!("edgeiq-capacity-{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, "27\n").unwrap();
        let mut m = BatteryMonitor::sysfs(&path, 30.0);
        assert_eq!(m.level(), Some(27.0));
        assert!(!m.ok());
        std::fs::write(&path, "64\n").unwrap();
        assert!(m.ok());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_sysfs_file_means_mains_power() {
        let mut m = BatteryMonitor::sysfs("/nonexistent/edgeiq/capacity", 30.0);
        assert_eq!(m.level(), None);
        assert!(m.ok());
    }
}
