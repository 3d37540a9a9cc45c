//! Priority queue of registered tasks with eligibility times.

use std::collections::{BTreeMap, HashSet};

use tokio::time::Instant;

/// A queued task.
#[derive(Debug, Clone)]
pub struct QueueEntry<T> {
    /// Lower value means higher precedence.
    pub priority: i32,
    /// Insertion sequence, strictly increasing across all insertions.
    pub sequence: u64,
    /// Task name, unique within the queue.
    pub name: String,
    /// Earliest instant at which the task may run.
    pub eligible_at: Instant,
    /// Caller payload (the scheduler stores a task slot index).
    pub item: T,
}

/// Result of asking the queue for work.
#[derive(Debug)]
pub enum Selection<T> {
    /// Highest-precedence eligible entry, removed from the queue.
    Ready(QueueEntry<T>),
    /// Nothing is eligible yet; the earliest entry becomes eligible at this instant.
    WaitUntil(Instant),
    /// The queue holds no entries.
    Empty,
}

/// Queue ordered by `(priority, sequence)` with FIFO tie-breaking.
///
/// A task name appears at most once. Selection only considers entries whose
/// eligibility time has passed, so a high-priority task waiting out its
/// period never blocks an eligible lower-priority one.
#[derive(Debug)]
pub struct TaskQueue<T> {
    entries: BTreeMap<(i32, u64), QueueEntry<T>>,
    names: HashSet<String>,
    next_sequence: u64,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            names: HashSet::new(),
            next_sequence: 0,
        }
    }
}

impl<T> TaskQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task, assigning the next sequence number.
    ///
    /// Returns `false` without inserting when `name` is already queued.
    pub fn push(&mut self, name: &str, item: T, priority: i32, eligible_at: Instant) -> bool {
        if !self.names.insert(name.to_owned()) {
            return false;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.insert(
            (priority, sequence),
            QueueEntry {
                priority,
                sequence,
                name: name.to_owned(),
                eligible_at,
                item,
            },
        );
        true
    }

    /// Remove and return the best eligible entry at `now`, or report when the
    /// next one becomes eligible.
    pub fn select(&mut self, now: Instant) -> Selection<T> {
        let ready = self
            .entries
            .iter()
            .find(|(_, e)| e.eligible_at <= now)
            .map(|(key, _)| *key);
        if let Some(key) = ready {
            if let Some(entry) = self.entries.remove(&key) {
                self.names.remove(&entry.name);
                return Selection::Ready(entry);
            }
        }
        self.next_eligible_at().map_or(Selection::Empty, Selection::WaitUntil)
    }

    /// Earliest eligibility time among queued entries.
    pub fn next_eligible_at(&self) -> Option<Instant> {
        self.entries.values().map(|e| e.eligible_at).min()
    }

    /// Whether a task with this name is queued.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Names in `(priority, sequence)` order, ignoring eligibility.
    pub fn names_in_order(&self) -> Vec<&str> {
        self.entries.values().map(|e| e.name.as_str()).collect()
    }

    /// Current depth.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ready_name<T>(q: &mut TaskQueue<T>, now: Instant) -> String {
        match q.select(now) {
            Selection::Ready(e) => e.name,
            other => panic!("expected ready entry, got {}", describe(&other)),
        }
    }

    fn describe<T>(s: &Selection<T>) -> &'static str {
        match s {
            Selection::Ready(_) => "ready",
            Selection::WaitUntil(_) => "wait",
            Selection::Empty => "empty",
        }
    }

    #[test]
    fn test_priority_ordering() {
        let now = Instant::now();
        let mut q = TaskQueue::new();
        q.push("low", (), 9, now);
        q.push("critical", (), -1, now);
        q.push("normal", (), 5, now);
        q.push("high", (), 2, now);

        assert_eq!(ready_name(&mut q, now), "critical");
        assert_eq!(ready_name(&mut q, now), "high");
        assert_eq!(ready_name(&mut q, now), "normal");
        assert_eq!(ready_name(&mut q, now), "low");
        assert!(matches!(q.select(now), Selection::Empty));
    }

    #[test]
    fn test_fifo_within_priority() {
        let now = Instant::now();
        let mut q = TaskQueue::new();
        q.push("a", (), 5, now);
        q.push("b", (), 5, now);
        q.push("c", (), 5, now);

        assert_eq!(ready_name(&mut q, now), "a");
        assert_eq!(ready_name(&mut q, now), "b");
        assert_eq!(ready_name(&mut q, now), "c");
    }

    #[test]
    fn test_reinsert_rotates_equal_priorities() {
        let now = Instant::now();
        let mut q = TaskQueue::new();
        q.push("a", (), 5, now);
        q.push("b", (), 5, now);

        let first = ready_name(&mut q, now);
        q.push(&first, (), 5, now);
        assert_eq!(ready_name(&mut q, now), "b");
        assert_eq!(ready_name(&mut q, now), "a");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let now = Instant::now();
        let mut q = TaskQueue::new();
        assert!(q.push("temp", 0, 1, now));
        assert!(!q.push("temp", 1, 0, now));
        assert_eq!(q.len(), 1);
        assert!(q.contains("temp"));
    }

    #[test]
    fn test_not_eligible_head_does_not_block() {
        let now = Instant::now();
        let later = now + Duration::from_secs(5);
        let mut q = TaskQueue::new();
        q.push("urgent", (), 0, later);
        q.push("background", (), 10, now);

        assert_eq!(ready_name(&mut q, now), "background");
        match q.select(now) {
            Selection::WaitUntil(at) => assert_eq!(at, later),
            other => panic!("expected wait, got {}", describe(&other)),
        }
        assert_eq!(ready_name(&mut q, later), "urgent");
    }

    #[test]
    fn test_wait_reports_earliest() {
        let now = Instant::now();
        let mut q = TaskQueue::new();
        q.push("a", (), 0, now + Duration::from_secs(3));
        q.push("b", (), 1, now + Duration::from_secs(1));
        assert_eq!(q.next_eligible_at(), Some(now + Duration::from_secs(1)));
        assert_eq!(q.names_in_order(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_queue() {
        let mut q = TaskQueue::<()>::new();
        assert!(matches!(q.select(Instant::now()), Selection::Empty));
        assert_eq!(q.len(), 0);
        assert!(q.is_empty());
    }
}
