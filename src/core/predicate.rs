//! Resource gates consulted before each task invocation.
//!
//! A gate is a plain Boolean: the scheduler does not care *why* energy or
//! the network is insufficient, it only defers the current task. Calls take
//! `&mut self` because implementations may have observable side effects
//! (for example, advancing a simulated battery drain); the scheduler never
//! relies on a predicate being idempotent.

/// Reports whether the node currently has enough energy budget to run a task.
pub trait EnergyPredicate: Send {
    /// Current verdict.
    fn ok(&mut self) -> bool;
}

/// Reports whether the network link is currently healthy enough to publish.
pub trait NetworkPredicate: Send {
    /// Current verdict.
    fn ok(&mut self) -> bool;
}

impl<F> EnergyPredicate for F
where
    F: FnMut() -> bool + Send,
{
    fn ok(&mut self) -> bool {
        self()
    }
}

impl<F> NetworkPredicate for F
where
    F: FnMut() -> bool + Send,
{
    fn ok(&mut self) -> bool {
        self()
    }
}

/// Gate that always passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOk;

impl EnergyPredicate for AlwaysOk {
    fn ok(&mut self) -> bool {
        true
    }
}

impl NetworkPredicate for AlwaysOk {
    fn ok(&mut self) -> bool {
        true
    }
}
