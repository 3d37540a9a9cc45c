//! Wall-clock helpers.
//!
//! Scheduling decisions use the monotonic `tokio::time::Instant`; these
//! helpers only stamp records that leave the process.

use std::time::{SystemTime, UNIX_EPOCH};

/// Fractional seconds since the Unix epoch.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
