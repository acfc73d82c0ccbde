//! chronolog-core
//!
//! In-memory ordered completion log for short-lived named tasks. Producers
//! report `start`/`end` lifecycle events; consumers `poll` for completion
//! records and receive them in strict start-time order, FIFO among blocked
//! pollers, even though tasks may finish in any order.
//!
//! # Modules
//! - **log**: the core component (`TaskLog` trait, `InMemoryTaskLog`, task
//!   records, ordering state)
//! - **lane**: shard scheduler (fixed single-threaded lanes, id-routed)
//! - **clock**: time source port (`SystemClock` for production,
//!   `ManualClock` for tests)
//! - **config**: construction-time settings
//! - **error**: error taxonomy
//! - **observability**: counts snapshot

pub mod clock;
pub mod config;
pub mod error;
mod lane;
pub mod log;
pub mod observability;

pub use config::TaskLogConfig;
pub use error::LogError;
pub use log::{InMemoryTaskLog, Task, TaskId, TaskLog};
pub use observability::LogCounts;
