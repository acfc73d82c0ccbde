use std::time::Duration;

use thiserror::Error;

use crate::log::TaskId;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("duplicate task id: {0}")]
    DuplicateTask(TaskId),

    #[error("poll timed out after {0:?}")]
    PollTimeout(Duration),

    #[error("poll interrupted before a completion arrived")]
    Interrupted,
}
