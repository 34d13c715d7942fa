pub mod event;

use std::path::{Path, PathBuf};

use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc as tokio_mpsc;
use tokio::task::JoinHandle;

use crate::directory::WatchedDirectory;
use crate::error::{MirrorError, Result};
use crate::exclude::ExcludeSet;
use crate::logging::{debug, error, warn};

use event::{FileEvent, FileEventKind, classify};

/// Handle to a running watcher. Keeps the OS watch alive (dropping stops watching).
pub struct WatcherHandle {
    /// Keep alive: dropping the watcher stops the OS watch and ends the bridge.
    _watcher: notify::RecommendedWatcher,
    /// The bridge task forwarding classified events from the std channel to tokio.
    _bridge_task: JoinHandle<()>,
}

/// Start watching `input` (non-recursively).
///
/// Returns a `WatcherHandle` (must be kept alive) and a bounded tokio receiver
/// that yields classified `FileEvent`s in the order the OS reported them.
///
/// The notify callback only pushes into an unbounded std channel, so the OS
/// side never waits on us. A blocking bridge thread classifies notifications
/// and forwards them with `blocking_send`: when the router falls behind, the
/// bridge waits instead of dropping events.
///
/// The receiver closes when the watched directory itself disappears or when
/// the notification source shuts down; the caller treats that as a lost watch.
pub fn start_watcher(
    input: &WatchedDirectory,
    exclude: ExcludeSet,
    capacity: usize,
) -> Result<(WatcherHandle, tokio_mpsc::Receiver<FileEvent>)> {
    let root = input.path().to_path_buf();
    let (std_tx, std_rx) = std::sync::mpsc::channel::<notify::Result<notify::Event>>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let _ = std_tx.send(res);
    })
    .map_err(|source| MirrorError::WatchStart {
        path: root.clone(),
        source,
    })?;
    watcher
        .watch(&root, RecursiveMode::NonRecursive)
        .map_err(|source| MirrorError::WatchStart {
            path: root.clone(),
            source,
        })?;

    let (tokio_tx, tokio_rx) = tokio_mpsc::channel::<FileEvent>(capacity.max(1));

    let bridge_task = tokio::task::spawn_blocking(move || {
        while let Ok(result) = std_rx.recv() {
            match result {
                Ok(raw) => {
                    if root_removed(&raw, &root) {
                        error!(path = %root.display(), "watched directory removed");
                        return;
                    }
                    for file_event in classify(&raw) {
                        if file_event.path == root || !should_forward(&file_event, &exclude) {
                            continue;
                        }
                        debug!(path = %file_event.path.display(), kind = %file_event.kind, "file event");
                        if tokio_tx.blocking_send(file_event).is_err() {
                            return; // receiver dropped, shutdown
                        }
                    }
                }
                Err(err) => {
                    warn!("watcher error: {err}");
                }
            }
        }
    });

    Ok((
        WatcherHandle {
            _watcher: watcher,
            _bridge_task: bridge_task,
        },
        tokio_rx,
    ))
}

fn root_removed(raw: &notify::Event, root: &Path) -> bool {
    let gone = matches!(
        raw.kind,
        notify::EventKind::Remove(_)
            | notify::EventKind::Modify(notify::event::ModifyKind::Name(_))
    );
    gone && raw.paths.iter().any(|p| p == root) && !root.is_dir()
}

/// Drop events for excluded names and for paths that are directories now.
///
/// Deleted paths cannot be inspected anymore, so only the name filter applies
/// to them.
fn should_forward(event: &FileEvent, exclude: &ExcludeSet) -> bool {
    if exclude.is_excluded(&event.path) {
        return false;
    }
    !(event.kind != FileEventKind::Deleted && event.path.is_dir())
}

/// List regular files directly inside `input`, skipping excluded names.
///
/// Uses the `ignore` walker with its filters disabled: hidden files and
/// ignore-file entries are mirrored like any other file.
pub fn existing_files(input: &Path, exclude: &ExcludeSet) -> Vec<PathBuf> {
    let walker = ignore::WalkBuilder::new(input)
        .standard_filters(false)
        .max_depth(Some(1))
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!("{err}");
                continue;
            }
        };
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        if exclude.is_excluded(path) {
            continue;
        }
        files.push(path.to_path_buf());
    }
    files.sort();
    files
}
