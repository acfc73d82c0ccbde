use serde::{Deserialize, Serialize};

/// Point-in-time counts for inspection and test synchronization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogCounts {
    /// Live tasks whose end has not been recorded yet.
    pub pending: usize,
    /// Tasks that ended but have not been delivered to a poll.
    pub resolved: usize,
    /// Polls currently blocked waiting for a completion.
    pub waiters: usize,
}
