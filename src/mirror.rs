//! Process wiring: directories, watcher, router and the two lanes.

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::Settings;
use crate::directory::{WatchedDirectory, ensure_pair};
use crate::error::{MirrorError, Result};
use crate::exclude::ExcludeSet;
use crate::generator::ReportGenerator;
use crate::lane::{LaneHandle, spawn_lane};
use crate::logging::{error, info};
use crate::output::{NoticeSink, RunSummary};
use crate::pipeline::{DeletionPipeline, ReportPipeline};
use crate::router::{Router, RouterStats};
use crate::watcher::event::{FileEvent, FileEventKind};
use crate::watcher::{WatcherHandle, existing_files, start_watcher};

/// A validated input/output pair plus everything needed to keep it mirrored.
pub struct Mirror<G> {
    input: WatchedDirectory,
    output: WatchedDirectory,
    settings: Settings,
    exclude: ExcludeSet,
    generator: Arc<G>,
    sink: NoticeSink,
}

impl<G: ReportGenerator> Mirror<G> {
    /// Validate (and create if needed) both directories.
    ///
    /// Fails before anything is watched when a directory path is a regular
    /// file, cannot be created, both paths name the same directory, or an
    /// exclusion pattern is invalid.
    pub fn new(settings: Settings, generator: G, sink: NoticeSink) -> Result<Self> {
        let exclude = ExcludeSet::new(settings.exclude.as_slice())?;
        let (input, output) = ensure_pair(&settings.input_dir, &settings.output_dir)?;

        Ok(Self {
            input,
            output,
            settings,
            exclude,
            generator: Arc::new(generator),
            sink,
        })
    }

    pub fn input(&self) -> &WatchedDirectory {
        &self.input
    }

    pub fn output(&self) -> &WatchedDirectory {
        &self.output
    }

    /// One-shot mirror of the files currently in the input directory.
    ///
    /// With `prune`, reports whose input file no longer exists are deleted too.
    /// Returns once every job has finished.
    pub async fn sync(&self, prune: bool) -> Result<RunSummary> {
        let (mut router, lanes) = self.spawn_pipeline();

        let mut routed = Ok(());
        for event in self.existing_events(prune) {
            if let Err(err) = router.route(event).await {
                routed = Err(err);
                break;
            }
        }

        let stats = router.stats();
        drop(router);
        let summary = lanes.join(stats).await;
        routed.map(|()| summary)
    }

    /// Start watching. Must be called from within a tokio runtime.
    ///
    /// The watch is established before anything else is spawned; failing to
    /// establish it is a startup error. When `initial_sync` is set the files
    /// already present are routed first, then live events follow.
    pub fn start(self) -> Result<MirrorHandle> {
        let (watcher, events) = start_watcher(
            &self.input,
            self.exclude.clone(),
            self.settings.queue_capacity,
        )?;
        info!(
            input = %self.input.path().display(),
            output = %self.output.path().display(),
            "watching"
        );

        let seed = if self.settings.initial_sync {
            self.existing_events(false)
        } else {
            Vec::new()
        };

        let (router, lanes) = self.spawn_pipeline();
        let (stop_tx, stop_rx) = oneshot::channel();
        let router_task = tokio::spawn(run_router(
            router,
            seed,
            events,
            stop_rx,
            self.input.path().to_path_buf(),
        ));

        Ok(MirrorHandle {
            watcher,
            stop: stop_tx,
            router: router_task,
            lanes,
        })
    }

    fn spawn_pipeline(&self) -> (Router, Lanes) {
        let (report_tx, reports) = spawn_lane(
            "report",
            Arc::new(ReportPipeline::new(Arc::clone(&self.generator))),
            self.settings.report_workers,
            self.settings.queue_capacity,
            self.sink,
        );
        let (deletion_tx, deletions) = spawn_lane(
            "deletion",
            Arc::new(DeletionPipeline),
            self.settings.deletion_workers,
            self.settings.queue_capacity,
            self.sink,
        );

        (
            Router::new(self.output.clone(), report_tx, deletion_tx),
            Lanes { reports, deletions },
        )
    }

    /// Created events for existing input files; with `prune`, Deleted events
    /// for output files that have no input counterpart.
    fn existing_events(&self, prune: bool) -> Vec<FileEvent> {
        let inputs = existing_files(self.input.path(), &self.exclude);

        let mut events: Vec<FileEvent> = inputs
            .iter()
            .map(|path| FileEvent::new(path.clone(), FileEventKind::Created))
            .collect();

        if prune {
            let names: HashSet<_> = inputs.iter().filter_map(|p| p.file_name()).collect();
            for report in existing_files(self.output.path(), &ExcludeSet::default()) {
                if let Some(name) = report.file_name()
                    && !names.contains(name)
                {
                    events.push(FileEvent::new(
                        self.input.join(name),
                        FileEventKind::Deleted,
                    ));
                }
            }
        }

        events
    }
}

struct Lanes {
    reports: LaneHandle,
    deletions: LaneHandle,
}

impl Lanes {
    /// Wait for both lanes to drain. Their senders must already be dropped.
    async fn join(self, stats: RouterStats) -> RunSummary {
        let reports = self.reports.join().await;
        let deletions = self.deletions.join().await;
        RunSummary {
            written: reports.succeeded,
            deleted: deletions.succeeded,
            report_failures: reports.failed,
            deletion_failures: deletions.failed,
            unclassified: stats.unclassified,
        }
    }
}

/// Route seed events, then live events until stopped or the watch is lost.
///
/// The router (and with it both lane senders) is dropped on return, which
/// lets the lanes drain and finish.
async fn run_router(
    mut router: Router,
    seed: Vec<FileEvent>,
    mut events: mpsc::Receiver<FileEvent>,
    mut stop: oneshot::Receiver<()>,
    input: PathBuf,
) -> (RouterStats, Result<()>) {
    for event in seed {
        if let Err(err) = router.route(event).await {
            return (router.stats(), Err(err));
        }
    }

    let result = loop {
        tokio::select! {
            _ = &mut stop => break Ok(()),
            next = events.recv() => match next {
                Some(event) => {
                    if let Err(err) = router.route(event).await {
                        break Err(err);
                    }
                }
                None => break Err(MirrorError::WatchLost { path: input }),
            },
        }
    };

    (router.stats(), result)
}

/// A running mirror. Dropping it stops watching and leaves queued jobs to
/// finish detached; [`MirrorHandle::shutdown`] waits for them.
pub struct MirrorHandle {
    watcher: WatcherHandle,
    stop: oneshot::Sender<()>,
    router: JoinHandle<(RouterStats, Result<()>)>,
    lanes: Lanes,
}

impl MirrorHandle {
    /// Run until `signal` resolves or the watch is lost, then drain.
    ///
    /// Queued and in-flight jobs always complete before this returns. A lost
    /// watch is reported as [`MirrorError::WatchLost`] after draining.
    pub async fn run_until<F>(self, signal: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let MirrorHandle {
            watcher,
            stop,
            mut router,
            lanes,
        } = self;

        let finished = tokio::select! {
            _ = signal => None,
            res = &mut router => Some(res),
        };
        let res = match finished {
            Some(res) => res,
            None => {
                let _ = stop.send(());
                router.await
            }
        };
        drop(watcher);

        let (stats, result) = match res {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("router task stopped: {err}");
                (RouterStats::default(), Ok(()))
            }
        };

        let summary = lanes.join(stats).await;
        if let Err(err) = &result {
            error!(
                written = summary.written,
                deleted = summary.deleted,
                failed = summary.failures(),
                "stopping after drain: {err}"
            );
        }
        result.map(|()| summary)
    }

    /// Stop watching now and wait for outstanding jobs.
    pub async fn shutdown(self) -> Result<RunSummary> {
        self.run_until(std::future::ready(())).await
    }
}
