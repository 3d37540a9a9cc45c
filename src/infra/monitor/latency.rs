//! Latency-based network gate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::core::NetworkPredicate;

/// Shared latency sample (milliseconds) written by an external prober.
#[derive(Debug, Clone)]
pub struct LatencyHandle(Arc<AtomicU64>);

impl LatencyHandle {
    /// Create a handle holding `latency_ms`.
    pub fn new(latency_ms: u64) -> Self {
        Self(Arc::new(AtomicU64::new(latency_ms)))
    }

    /// Publish a fresh sample.
    pub fn set(&self, latency_ms: u64) {
        self.0.store(latency_ms, Ordering::Release);
    }

    /// Latest sample.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

/// Where latency samples come from.
#[derive(Debug, Clone)]
pub enum LatencySource {
    /// `base_ms` plus uniform jitter in `0..=jitter_ms`, drawn on every check.
    Simulated {
        /// Baseline latency.
        base_ms: u64,
        /// Maximum added jitter.
        jitter_ms: u64,
        /// Random source.
        rng: StdRng,
    },
    /// Samples supplied by the embedding application.
    Reported(LatencyHandle),
}

/// Network gate passing while latency is at or below a limit.
#[derive(Debug, Clone)]
pub struct LatencyMonitor {
    source: LatencySource,
    limit_ms: u64,
    last_sample_ms: Option<u64>,
    last_ok: Option<bool>,
}

impl LatencyMonitor {
    /// Create a monitor over `source`.
    pub const fn new(source: LatencySource, limit_ms: u64) -> Self {
        Self {
            source,
            limit_ms,
            last_sample_ms: None,
            last_ok: None,
        }
    }

    /// Simulated link seeded from the thread RNG.
    pub fn simulated(base_ms: u64, jitter_ms: u64, limit_ms: u64) -> Self {
        Self::simulated_with_seed(base_ms, jitter_ms, limit_ms, rand::random())
    }

    /// Simulated link with a fixed seed, for reproducible runs.
    pub fn simulated_with_seed(base_ms: u64, jitter_ms: u64, limit_ms: u64, seed: u64) -> Self {
        Self::new(
            LatencySource::Simulated {
                base_ms,
                jitter_ms,
                rng: StdRng::seed_from_u64(seed),
            },
            limit_ms,
        )
    }

    /// Link latency fed through `handle`.
    pub const fn reported(handle: LatencyHandle, limit_ms: u64) -> Self {
        Self::new(LatencySource::Reported(handle), limit_ms)
    }

    /// Configured ceiling.
    pub const fn limit_ms(&self) -> u64 {
        self.limit_ms
    }

    /// Sample taken by the most recent check.
    pub const fn last_sample_ms(&self) -> Option<u64> {
        self.last_sample_ms
    }

    fn sample(&mut self) -> u64 {
        match &mut self.source {
            LatencySource::Simulated {
                base_ms,
                jitter_ms,
                rng,
            } => base_ms.saturating_add(rng.random_range(0..=*jitter_ms)),
            LatencySource::Reported(handle) => handle.get(),
        }
    }
}

impl NetworkPredicate for LatencyMonitor {
    fn ok(&mut self) -> bool {
        let latency_ms = self.sample();
        self.last_sample_ms = Some(latency_ms);
        let ok = latency_ms <= self.limit_ms;
        if self.last_ok != Some(ok) {
            if ok {
                info!(latency_ms, limit_ms = self.limit_ms, "network link healthy");
            } else {
                warn!(latency_ms, limit_ms = self.limit_ms, "network latency above limit");
            }
            self.last_ok = Some(ok);
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_samples_stay_in_range() {
        let mut m = LatencyMonitor::simulated_with_seed(100, 50, 200, 7);
        for _ in 0..100 {
            assert!(m.ok());
            let sample = m.last_sample_ms().unwrap();
            assert!((100..=150).contains(&sample));
        }
    }

    #[test]
    fn simulated_over_limit_fails() {
        let mut m = LatencyMonitor::simulated_with_seed(250, 0, 200, 1);
        assert!(!m.ok());
        assert_eq!(m.last_sample_ms(), Some(250));
    }

    #[test]
    fn limit_is_inclusive() {
        let handle = LatencyHandle::new(200);
        let mut m = LatencyMonitor::reported(handle.clone(), 200);
        assert!(m.ok());
        handle.set(201);
        assert!(!m.ok());
        handle.set(35);
        assert!(m.ok());
    }

    #[test]
    fn seeded_monitors_agree() {
        let mut a = LatencyMonitor::simulated_with_seed(10, 500, 200, 42);
        let mut b = LatencyMonitor::simulated_with_seed(10, 500, 200, 42);
        for _ in 0..20 {
            assert_eq!(a.ok(), b.ok());
            assert_eq!(a.last_sample_ms(), b.last_sample_ms());
        }
    }
}
