//! Task record: id, ordering key, write-once end timestamp.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Task identifier. Unique among live tasks; supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lane routing. The same id maps to the same lane for the life of the
    /// log, so a task's own start and end apply in submission order.
    pub(crate) fn lane(&self, lanes: usize) -> usize {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        (hasher.finish() % lanes as u64) as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle record for one timed unit of work.
///
/// Design:
/// - `start_time` is a caller-supplied ordering key, not wall-clock time.
/// - `end_time` transitions unset -> set exactly once. A task with it set is
///   "resolved" but stays queued until it is the earliest pending one.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub start_time: i64,
    pub end_time: Option<i64>,
}

impl Task {
    pub fn new(id: TaskId, start_time: i64) -> Self {
        Self {
            id,
            start_time,
            end_time: None,
        }
    }

    /// Record the end timestamp. Returns false if it was already set.
    pub fn mark_ended(&mut self, end_time: i64) -> bool {
        if self.end_time.is_some() {
            return false;
        }
        self.end_time = Some(end_time);
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.end_time.is_some()
    }

    /// Human-readable completion line. The format is stable; tests and the
    /// poll contract depend on it byte for byte.
    pub fn completion_line(&self) -> String {
        format!(
            "task {} started at: {} and ended at: {}",
            self.id,
            self.start_time,
            self.end_time.unwrap_or(-1)
        )
    }
}
