//! Energy and network gate implementations.

pub mod battery;
pub mod latency;

pub use battery::{BatteryMonitor, BatterySource, EnergyHandle};
pub use latency::{LatencyHandle, LatencyMonitor, LatencySource};
