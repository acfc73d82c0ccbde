//! Shard scheduler: a fixed pool of single-threaded lifecycle lanes.
//!
//! Jobs for one task id always land on the same lane and apply strictly in
//! submission order; different ids spread across lanes and proceed in
//! parallel. Dispatch never blocks the caller.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::log::TaskId;

/// One lifecycle mutation, routed by task id.
#[derive(Debug)]
pub(crate) enum LaneJob {
    Start { id: TaskId, start_time: i64 },
    End { id: TaskId },
}

/// Applies jobs on behalf of a lane. Seam between the pool and the log.
#[async_trait]
pub(crate) trait LaneExecutor: Send + Sync + 'static {
    async fn execute(&self, job: LaneJob);
}

/// Lane pool handle.
/// - `dispatch` routes by the id's stable hash.
/// - `request_shutdown` stops every lane after its in-flight job.
pub(crate) struct LanePool {
    senders: Vec<mpsc::UnboundedSender<LaneJob>>,
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl LanePool {
    /// Spawn `n` lanes (clamped to at least one).
    pub fn spawn(n: usize, executor: Arc<dyn LaneExecutor>) -> Self {
        let n = n.max(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut senders = Vec::with_capacity(n);
        let mut joins = Vec::with_capacity(n);
        for lane_id in 0..n {
            let (tx, rx) = mpsc::unbounded_channel();
            let exec = Arc::clone(&executor);
            let rx_shutdown = shutdown_rx.clone();
            joins.push(tokio::spawn(async move {
                lane_loop(lane_id, rx, exec, rx_shutdown).await;
            }));
            senders.push(tx);
        }

        Self {
            senders,
            shutdown_tx,
            joins,
        }
    }

    pub fn lane_count(&self) -> usize {
        self.senders.len()
    }

    /// Fire-and-forget submission. A send error means the pool is already
    /// shut down; the job is dropped, matching the no-error-channel contract.
    pub fn dispatch(&self, id: &TaskId, job: LaneJob) {
        let lane = id.lane(self.senders.len());
        if self.senders[lane].send(job).is_err() {
            tracing::warn!(task = %id, lane, "lane pool is shut down; dropping job");
        }
    }

    /// Request shutdown for all lanes.
    pub fn request_shutdown(&self) {
        // ignore send error: receivers may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for every lane to finish its in-flight job.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            let _ = join.await;
        }
    }
}

async fn lane_loop(
    lane_id: usize,
    mut jobs: mpsc::UnboundedReceiver<LaneJob>,
    executor: Arc<dyn LaneExecutor>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        let job = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
            job = jobs.recv() => job,
        };

        // None: every sender is gone, the log itself was dropped
        let Some(job) = job else { break };
        tracing::trace!(lane_id, ?job, "applying lifecycle job");
        executor.execute(job).await;
    }
}
