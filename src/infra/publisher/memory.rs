//! In-memory publisher backend.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{Envelope, PublishError, Publisher};

#[derive(Debug, Default)]
struct State {
    connected: bool,
    envelopes: Vec<Envelope>,
    fail_next: usize,
    connects: usize,
}

/// Publisher that records envelopes in memory, for development and testing.
///
/// Clones share the same record, so a test can keep a handle while the
/// scheduler borrows another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPublisher {
    state: Arc<Mutex<State>>,
}

impl InMemoryPublisher {
    /// Create a disconnected publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` publishes fail with a transient error.
    pub fn fail_next(&self, count: usize) {
        self.state.lock().fail_next = count;
    }

    /// Envelopes accepted so far, in publish order.
    pub fn envelopes(&self) -> Vec<Envelope> {
        self.state.lock().envelopes.clone()
    }

    /// Accepted envelopes for one task, in publish order.
    pub fn envelopes_for(&self, task: &str) -> Vec<Envelope> {
        self.state
            .lock()
            .envelopes
            .iter()
            .filter(|e| e.task == task)
            .cloned()
            .collect()
    }

    /// Whether `connect` has been called without a later `disconnect`.
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Number of successful `connect` calls.
    pub fn connect_count(&self) -> usize {
        self.state.lock().connects
    }
}

#[async_trait]
impl Publisher for InMemoryPublisher {
    async fn connect(&mut self) -> Result<(), PublishError> {
        let mut state = self.state.lock();
        state.connected = true;
        state.connects += 1;
        Ok(())
    }

    async fn publish(&mut self, envelope: &Envelope) -> Result<(), PublishError> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(PublishError::NotConnected);
        }
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(PublishError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "injected publish failure",
            )));
        }
        state.envelopes.push(envelope.clone());
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.state.lock().connected = false;
    }
}
