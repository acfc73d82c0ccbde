//! In-memory task log implementation.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::state::OrderState;
use super::{Task, TaskId, TaskLog};
use crate::clock::{Clock, SystemClock};
use crate::config::TaskLogConfig;
use crate::error::LogError;
use crate::lane::{LaneExecutor, LaneJob, LanePool};
use crate::observability::LogCounts;

/// Shared innards: the registry plus the mutex-guarded ordering state.
///
/// Lock discipline:
/// - `order` guards the pending index and waiter queue as a pair; every
///   compound check/mutate sequence runs inside it.
/// - `registry` entries are written only by the lane owning the id and read
///   by polls/drains; DashMap's shard locks make a lane's `end_time` write
///   visible to a concurrent reader.
/// - A registry guard is never held while taking `order`, and never across
///   an await.
struct LogCore {
    registry: DashMap<TaskId, Task>,
    order: Mutex<OrderState>,
    clock: Arc<dyn Clock>,
}

impl LogCore {
    /// Record a start. An id that is still live is rejected.
    async fn apply_start(&self, id: TaskId, start_time: i64) {
        match self.registry.entry(id.clone()) {
            Entry::Occupied(_) => {
                let fault = LogError::DuplicateTask(id);
                tracing::warn!(error = %fault, "start rejected");
                return;
            }
            Entry::Vacant(slot) => {
                slot.insert(Task::new(id.clone(), start_time));
            }
        }

        let mut order = self.order.lock().await;
        order.insert_pending(start_time, id);
    }

    /// Stamp the end timestamp, then hand ready completions to waiters.
    async fn apply_end(&self, id: TaskId) {
        let end_time = self.clock.now_millis();
        let stamped = match self.registry.get_mut(&id) {
            Some(mut task) => task.mark_ended(end_time),
            None => {
                let fault = LogError::TaskNotFound(id);
                tracing::warn!(error = %fault, "end ignored");
                return;
            }
        };
        if !stamped {
            tracing::warn!(task = %id, "end ignored: end time already recorded");
            return;
        }
        tracing::debug!(task = %id, end_time, "task ended");

        let mut order = self.order.lock().await;
        self.drain(&mut order);
    }

    /// Match ready completions to blocked polls: earliest start first, FIFO
    /// across waiters. Runs entirely under the order lock.
    fn drain(&self, order: &mut OrderState) {
        while order.has_waiters() {
            let Some(task) = self.take_earliest_ready(order) else {
                break;
            };

            let mut line = task.completion_line();
            let mut delivered = false;
            while let Some(waiter) = order.pop_waiter() {
                match waiter.slot.send(line) {
                    Ok(()) => {
                        delivered = true;
                        break;
                    }
                    // receiver gone (cancelled poll); offer to the next one
                    Err(returned) => line = returned,
                }
            }

            if delivered {
                tracing::debug!(task = %task.id, "completion delivered to waiting poll");
            } else {
                // nobody is listening; put the task back so the completion
                // goes to a future poll instead of vanishing
                self.restore(order, task);
                break;
            }
        }
    }

    /// Remove and return the earliest-ready task, if any.
    ///
    /// Only the single earliest bucket is inspected: an unresolved task at
    /// the head blocks everything behind it until it ends. Scanning further
    /// buckets would break the ordering contract.
    fn take_earliest_ready(&self, order: &mut OrderState) -> Option<Task> {
        let (start_time, id) = {
            let (start_time, bucket) = order.earliest_bucket()?;
            let id = bucket
                .iter()
                .find(|id| self.registry.get(*id).is_some_and(|task| task.is_resolved()))?
                .clone();
            (start_time, id)
        };

        order.remove_pending(start_time, &id);
        let (_, task) = self.registry.remove(&id)?;
        Some(task)
    }

    /// Undo of `take_earliest_ready`.
    fn restore(&self, order: &mut OrderState, task: Task) {
        order.restore_pending(task.start_time, task.id.clone());
        self.registry.insert(task.id.clone(), task);
    }
}

#[async_trait]
impl LaneExecutor for LogCore {
    async fn execute(&self, job: LaneJob) {
        match job {
            LaneJob::Start { id, start_time } => self.apply_start(id, start_time).await,
            LaneJob::End { id } => self.apply_end(id).await,
        }
    }
}

/// In-memory ordered task log.
pub struct InMemoryTaskLog {
    core: Arc<LogCore>,
    /// Taken out (and joined) by `shutdown`; `None` afterwards.
    lanes: std::sync::Mutex<Option<LanePool>>,
    config: TaskLogConfig,
}

impl InMemoryTaskLog {
    pub fn new(config: TaskLogConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Build with an explicit clock. Tests pin end timestamps through it.
    pub fn with_clock(config: TaskLogConfig, clock: Arc<dyn Clock>) -> Self {
        let core = Arc::new(LogCore {
            registry: DashMap::new(),
            order: Mutex::new(OrderState::default()),
            clock,
        });
        let lanes = LanePool::spawn(config.lanes, Arc::clone(&core) as Arc<dyn LaneExecutor>);
        Self {
            core,
            lanes: std::sync::Mutex::new(Some(lanes)),
            config,
        }
    }

    /// Stop the lanes, wait for their in-flight jobs, and wake every
    /// blocked poll with `Interrupted`.
    ///
    /// There is no richer teardown contract: queued-but-unapplied lifecycle
    /// jobs are dropped, matching the fire-and-forget submission side.
    /// Already-resolved completions stay deliverable to later polls.
    pub async fn shutdown(&self) {
        let pool = self.lane_pool().take();
        if let Some(pool) = pool {
            pool.shutdown_and_join().await;
        }
        let mut order = self.core.order.lock().await;
        order.clear_waiters();
    }

    fn lane_pool(&self) -> std::sync::MutexGuard<'_, Option<LanePool>> {
        match self.lanes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn dispatch(&self, id: &TaskId, job: LaneJob) {
        match self.lane_pool().as_ref() {
            Some(pool) => pool.dispatch(id, job),
            None => tracing::warn!(task = %id, "log is shut down; dropping job"),
        }
    }
}

#[async_trait]
impl TaskLog for InMemoryTaskLog {
    fn start(&self, id: TaskId, start_time: i64) {
        let job = LaneJob::Start {
            id: id.clone(),
            start_time,
        };
        self.dispatch(&id, job);
    }

    fn end(&self, id: TaskId) {
        let job = LaneJob::End { id: id.clone() };
        self.dispatch(&id, job);
    }

    async fn poll(&self) -> Result<String, LogError> {
        let (ticket, mut slot) = {
            let mut order = self.core.order.lock().await;

            // FIFO fairness: while earlier polls are still queued, this one
            // may not jump the line even if a completion is ready.
            if !order.has_waiters() {
                if let Some(task) = self.core.take_earliest_ready(&mut order) {
                    return Ok(task.completion_line());
                }
            }
            order.register_waiter()
        };

        match timeout(self.config.poll_timeout, &mut slot).await {
            Ok(Ok(line)) => Ok(line),
            Ok(Err(_closed)) => Err(LogError::Interrupted),
            Err(_elapsed) => {
                let mut order = self.core.order.lock().await;
                if order.deregister_waiter(ticket) {
                    Err(LogError::PollTimeout(self.config.poll_timeout))
                } else {
                    // A drain fulfilled this waiter between the deadline and
                    // deregistration. The record is committed to this caller;
                    // take it out of the slot rather than losing it.
                    match slot.try_recv() {
                        Ok(line) => Ok(line),
                        Err(_) => Err(LogError::Interrupted),
                    }
                }
            }
        }
    }

    async fn counts(&self) -> LogCounts {
        let order = self.core.order.lock().await;
        let mut counts = LogCounts {
            waiters: order.waiter_count(),
            ..LogCounts::default()
        };
        for entry in self.core.registry.iter() {
            if entry.value().is_resolved() {
                counts.resolved += 1;
            } else {
                counts.pending += 1;
            }
        }
        counts
    }
}
