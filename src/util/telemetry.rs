//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Initialize tracing. Embedding applications can install their own
/// subscriber; this helper installs an env-based one (`RUST_LOG`, falling
/// back to `default_directive`) if none is set.
pub fn init_tracing(default_directive: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_tracing("edgeiq_orchestrator=debug");
        init_tracing("info");
        assert!(tracing::dispatcher::has_been_set());
    }
}
