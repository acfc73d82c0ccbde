//! Ordered task completion log.
//!
//! Producers report lifecycles with `start`/`end` (fire-and-forget);
//! consumers `poll` and receive completion records in strict start-time
//! order, FIFO among blocked pollers.

mod memory;
mod record;
mod state;

pub use memory::InMemoryTaskLog;
pub use record::{Task, TaskId};

use async_trait::async_trait;

use crate::error::LogError;
use crate::observability::LogCounts;

/// The operation surface of the log.
///
/// Design:
/// - `start`/`end` never block and have no error channel; lane-side faults
///   are logged, not thrown back across the async boundary.
/// - `poll` blocks the calling task until a completion is deliverable or the
///   configured timeout elapses.
#[async_trait]
pub trait TaskLog: Send + Sync {
    /// Report that `id` started at `start_time` (an ordering key).
    fn start(&self, id: TaskId, start_time: i64);

    /// Report that `id` finished. The end timestamp comes from the clock.
    fn end(&self, id: TaskId);

    /// Next completion record, in ascending start-time order.
    async fn poll(&self) -> Result<String, LogError>;

    /// Observability hook.
    async fn counts(&self) -> LogCounts;
}
