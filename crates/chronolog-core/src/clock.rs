//! Clock port: source of end timestamps.
//!
//! Start timestamps are caller-supplied ordering keys; only `end` consults
//! the clock. The trait exists so tests can pin end timestamps.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

/// Provides the current time for end stamps.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds. Monotonic; the origin is unspecified.
    fn now_millis(&self) -> i64;
}

/// Production clock: monotonic milliseconds since construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        self.origin.elapsed().as_millis() as i64
    }
}

/// Test clock: reports whatever was last `set`, never advances on its own.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
