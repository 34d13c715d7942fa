//! Asynchronous processing lanes.
//!
//! A lane is a bounded queue drained by a dispatcher task. The dispatcher
//! hands each job to the blocking thread pool, with at most `workers` jobs in
//! flight (semaphore-limited). When all workers are busy the dispatcher stops
//! pulling, the queue fills and `submit` waits: producers are slowed down,
//! jobs are never dropped.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::error::{MirrorError, Result};
use crate::logging::{error, warn};
use crate::output::NoticeSink;
use crate::pipeline::{JobHandler, Notice};

/// Producer side of a lane.
pub struct LaneSender<J> {
    name: &'static str,
    tx: mpsc::Sender<J>,
}

impl<J> Clone for LaneSender<J> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
        }
    }
}

impl<J: Send + 'static> LaneSender<J> {
    /// Enqueue `job`, waiting for queue space. Returns once queued, not once processed.
    pub async fn submit(&self, job: J) -> Result<()> {
        self.tx
            .send(job)
            .await
            .map_err(|_| MirrorError::LaneClosed { lane: self.name })
    }
}

#[cfg(test)]
impl<J> LaneSender<J> {
    /// Wrap a bare channel, for exercising producers without a dispatcher.
    pub(crate) fn from_channel(name: &'static str, tx: mpsc::Sender<J>) -> Self {
        Self { name, tx }
    }
}

/// Outcome counts of one lane.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LaneSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Consumer side of a lane; resolves once the lane has drained.
pub struct LaneHandle {
    name: &'static str,
    task: JoinHandle<LaneSummary>,
}

impl LaneHandle {
    /// Wait for the lane to finish every queued and in-flight job.
    ///
    /// The lane only finishes after all of its senders are dropped.
    pub async fn join(self) -> LaneSummary {
        match self.task.await {
            Ok(summary) => summary,
            Err(err) => {
                error!(lane = self.name, "lane dispatcher stopped: {err}");
                LaneSummary::default()
            }
        }
    }
}

/// Spawn a lane running `handler` for each submitted job.
pub fn spawn_lane<J, H>(
    name: &'static str,
    handler: Arc<H>,
    workers: usize,
    capacity: usize,
    sink: NoticeSink,
) -> (LaneSender<J>, LaneHandle)
where
    J: Send + 'static,
    H: JobHandler<J>,
{
    let (tx, mut rx) = mpsc::channel::<J>(capacity.max(1));

    let task = tokio::spawn(async move {
        let permits = Arc::new(Semaphore::new(workers.max(1)));
        let mut jobs = JoinSet::new();
        let mut summary = LaneSummary::default();

        while let Some(job) = rx.recv().await {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            let handler = Arc::clone(&handler);
            jobs.spawn_blocking(move || {
                let _permit = permit;
                handler.handle(job)
            });

            while let Some(res) = jobs.try_join_next() {
                record(name, res, &mut summary, sink);
            }
        }

        while let Some(res) = jobs.join_next().await {
            record(name, res, &mut summary, sink);
        }
        summary
    });

    (LaneSender { name, tx }, LaneHandle { name, task })
}

/// One line per job: the notice on success, a log record on failure.
fn record(
    lane: &'static str,
    res: std::result::Result<Result<Notice>, JoinError>,
    summary: &mut LaneSummary,
    sink: NoticeSink,
) {
    match res {
        Ok(Ok(notice)) => {
            summary.succeeded += 1;
            sink.emit(&notice);
        }
        Ok(Err(err @ MirrorError::OutputNotFound { .. })) => {
            summary.failed += 1;
            warn!(lane, "inconsistent output: {err}");
        }
        Ok(Err(err)) => {
            summary.failed += 1;
            error!(lane, "{err}");
        }
        Err(err) => {
            summary.failed += 1;
            error!(lane, "job aborted: {err}");
        }
    }
}
