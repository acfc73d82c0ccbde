//! Construction-time settings for the task log.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings supplied by the host process when it builds the log.
///
/// The core does no file or environment loading; wiring configuration in is
/// the host's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskLogConfig {
    /// Number of lifecycle lanes. Clamped to at least 1 at spawn time.
    pub lanes: usize,

    /// How long a poll blocks before failing with `PollTimeout`.
    pub poll_timeout: Duration,
}

impl TaskLogConfig {
    /// Default settings for v1: 4 lanes, 10 second poll bound.
    pub fn default_v1() -> Self {
        Self {
            lanes: 4,
            poll_timeout: Duration::from_secs(10),
        }
    }
}
