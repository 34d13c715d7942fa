use crate::directory::WatchedDirectory;
use crate::error::{MirrorError, Result};
use crate::lane::LaneSender;
use crate::logging::{debug, warn};
use crate::pipeline::{DeletionJob, ReportJob};
use crate::watcher::event::{FileEvent, FileEventKind};

/// Where an event ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Report,
    Deletion,
    /// Logged as unclassified; no job was created.
    Diagnostic,
}

/// Routing counts of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RouterStats {
    pub reports: usize,
    pub deletions: usize,
    pub unclassified: usize,
}

impl RouterStats {
    fn count(&mut self, route: Route) {
        match route {
            Route::Report => self.reports += 1,
            Route::Deletion => self.deletions += 1,
            Route::Diagnostic => self.unclassified += 1,
        }
    }
}

/// Turns file events into jobs for the report and deletion lanes.
pub struct Router {
    output: WatchedDirectory,
    reports: LaneSender<ReportJob>,
    deletions: LaneSender<DeletionJob>,
    stats: RouterStats,
}

impl Router {
    pub fn new(
        output: WatchedDirectory,
        reports: LaneSender<ReportJob>,
        deletions: LaneSender<DeletionJob>,
    ) -> Self {
        Self {
            output,
            reports,
            deletions,
            stats: RouterStats::default(),
        }
    }

    /// Dispatch one event.
    ///
    /// Returns as soon as the job is queued; waits only while the target
    /// lane's queue is full. Fails only when a lane has stopped.
    pub async fn route(&mut self, event: FileEvent) -> Result<Route> {
        let route = self.dispatch(event).await?;
        self.stats.count(route);
        Ok(route)
    }

    async fn dispatch(&self, event: FileEvent) -> Result<Route> {
        let Some(target) = self.output.target_for(&event.path) else {
            return Ok(unclassified(event));
        };

        match event.kind {
            FileEventKind::Created | FileEventKind::Updated => {
                debug!(path = %event.path.display(), kind = %event.kind, "routing");
                self.reports
                    .submit(ReportJob {
                        source: event.path,
                        target,
                    })
                    .await?;
                Ok(Route::Report)
            }
            FileEventKind::Deleted => {
                debug!(path = %event.path.display(), kind = %event.kind, "routing");
                self.deletions.submit(DeletionJob { target }).await?;
                Ok(Route::Deletion)
            }
            FileEventKind::Unknown => Ok(unclassified(event)),
        }
    }

    pub fn stats(&self) -> RouterStats {
        self.stats
    }
}

fn unclassified(event: FileEvent) -> Route {
    let err = MirrorError::UnclassifiedEvent { path: event.path };
    warn!("{err}");
    Route::Diagnostic
}
