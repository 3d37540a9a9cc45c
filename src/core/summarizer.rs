//! Per-task change filter.

use std::collections::HashMap;

use super::TaskOutput;

/// Outcome of a summarizer decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The result differs from the last emitted one and should be published.
    Emit(TaskOutput),
    /// The result equals the last emitted one.
    Suppress,
}

/// Suppresses identical consecutive results per task.
///
/// The stored value for a task is always the last *emitted* result. Entries
/// never expire on their own; use [`Summarizer::forget`] to drop one.
#[derive(Debug, Default)]
pub struct Summarizer {
    last: HashMap<String, TaskOutput>,
}

impl Summarizer {
    /// Create an empty summarizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `result` for `task` and remember it when emitted.
    ///
    /// `null` is a legal reading and follows the same equality rules.
    pub fn summarize(&mut self, task: &str, result: TaskOutput) -> Verdict {
        match self.last.get_mut(task) {
            Some(prev) if *prev == result => Verdict::Suppress,
            Some(prev) => {
                prev.clone_from(&result);
                Verdict::Emit(result)
            }
            None => {
                self.last.insert(task.to_owned(), result.clone());
                Verdict::Emit(result)
            }
        }
    }

    /// Remove the stored value for `task`; the next result is always emitted.
    pub fn forget(&mut self, task: &str) -> Option<TaskOutput> {
        self.last.remove(task)
    }

    /// Last emitted result for `task`.
    pub fn last(&self, task: &str) -> Option<&TaskOutput> {
        self.last.get(task)
    }

    /// Number of tasks with a stored result.
    pub fn len(&self) -> usize {
        self.last.len()
    }

    /// Whether no task has emitted yet.
    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_result_is_emitted() {
        let mut s = Summarizer::new();
        let v = s.summarize("temp", json!({ "temperature": 25.5 }));
        assert_eq!(v, Verdict::Emit(json!({ "temperature": 25.5 })));
        assert_eq!(s.last("temp"), Some(&json!({ "temperature": 25.5 })));
    }

    #[test]
    fn repeated_result_is_suppressed() {
        let mut s = Summarizer::new();
        s.summarize("temp", json!(1));
        for _ in 0..5 {
            assert_eq!(s.summarize("temp", json!(1)), Verdict::Suppress);
        }
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn change_overwrites_and_change_back_emits() {
        let mut s = Summarizer::new();
        assert!(matches!(s.summarize("ml", json!("normal")), Verdict::Emit(_)));
        assert!(matches!(s.summarize("ml", json!("anomaly")), Verdict::Emit(_)));
        assert_eq!(s.last("ml"), Some(&json!("anomaly")));
        assert!(matches!(s.summarize("ml", json!("normal")), Verdict::Emit(_)));
    }

    #[test]
    fn equality_ignores_key_order() {
        let mut s = Summarizer::new();
        let a: TaskOutput = serde_json::from_str(r#"{"a":1,"b":[1,2]}"#).unwrap();
        let b: TaskOutput = serde_json::from_str(r#"{"b":[1,2],"a":1}"#).unwrap();
        s.summarize("t", a);
        assert_eq!(s.summarize("t", b), Verdict::Suppress);
    }

    #[test]
    fn null_is_state() {
        let mut s = Summarizer::new();
        assert_eq!(s.summarize("t", json!(null)), Verdict::Emit(json!(null)));
        assert_eq!(s.summarize("t", json!(null)), Verdict::Suppress);
        assert!(matches!(s.summarize("t", json!(0)), Verdict::Emit(_)));
    }

    #[test]
    fn tasks_are_independent() {
        let mut s = Summarizer::new();
        s.summarize("a", json!(1));
        assert!(matches!(s.summarize("b", json!(1)), Verdict::Emit(_)));
    }

    #[test]
    fn forget_resets_task() {
        let mut s = Summarizer::new();
        s.summarize("t", json!(1));
        assert_eq!(s.forget("t"), Some(json!(1)));
        assert!(s.is_empty());
        assert!(matches!(s.summarize("t", json!(1)), Verdict::Emit(_)));
    }
}
