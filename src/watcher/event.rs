use std::fmt;
use std::path::{Path, PathBuf};

use notify::EventKind;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};

/// Kind of change observed on a file in the input directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventKind {
    Created,
    Updated,
    Deleted,
    /// The watcher saw a change it cannot map to one of the above.
    Unknown,
}

impl fmt::Display for FileEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One filesystem change, consumed exactly once by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
}

impl FileEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FileEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Map a raw notification to zero or more file events.
///
/// Access notifications and directory-level notifications carry no content
/// change and produce nothing. Renames produce a Deleted event for the old
/// name and a Created event for the new name. The inotify backend reports a
/// rename three times (`From`, `To`, then `Both`); `Both` is dropped so each
/// side is routed once.
pub fn classify(event: &notify::Event) -> Vec<FileEvent> {
    let kind = match event.kind {
        EventKind::Access(_) => return Vec::new(),
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
            return Vec::new();
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => return Vec::new(),
        EventKind::Create(_) => Some(FileEventKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(FileEventKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(FileEventKind::Created),
        // Direction unknown: decide from what is on disk now.
        EventKind::Modify(ModifyKind::Name(_)) => None,
        EventKind::Modify(_) => Some(FileEventKind::Updated),
        EventKind::Remove(_) => Some(FileEventKind::Deleted),
        EventKind::Any | EventKind::Other => Some(FileEventKind::Unknown),
    };

    event
        .paths
        .iter()
        .map(|path| FileEvent::new(path.clone(), kind.unwrap_or_else(|| kind_from_disk(path))))
        .collect()
}

fn kind_from_disk(path: &Path) -> FileEventKind {
    if path.exists() {
        FileEventKind::Created
    } else {
        FileEventKind::Deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, AccessMode, DataChange, MetadataKind};

    fn raw(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    fn kinds(event: &notify::Event) -> Vec<FileEventKind> {
        classify(event).into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_create_is_created() {
        let ev = raw(EventKind::Create(CreateKind::File), "/in/sales.csv");
        assert_eq!(
            classify(&ev),
            vec![FileEvent::new("/in/sales.csv", FileEventKind::Created)]
        );
    }

    #[test]
    fn test_content_and_metadata_changes_are_updates() {
        let data = raw(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            "/in/a",
        );
        let meta = raw(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
            "/in/a",
        );
        assert_eq!(kinds(&data), vec![FileEventKind::Updated]);
        assert_eq!(kinds(&meta), vec![FileEventKind::Updated]);
    }

    #[test]
    fn test_remove_is_deleted() {
        let ev = raw(EventKind::Remove(RemoveKind::File), "/in/a");
        assert_eq!(kinds(&ev), vec![FileEventKind::Deleted]);
    }

    #[test]
    fn test_renames_split_into_delete_and_create() {
        let from = raw(EventKind::Modify(ModifyKind::Name(RenameMode::From)), "/in/old");
        let to = raw(EventKind::Modify(ModifyKind::Name(RenameMode::To)), "/in/new");
        let both = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/in/old"))
            .add_path(PathBuf::from("/in/new"));

        assert_eq!(kinds(&from), vec![FileEventKind::Deleted]);
        assert_eq!(kinds(&to), vec![FileEventKind::Created]);
        assert!(classify(&both).is_empty());
    }

    #[test]
    fn test_rename_of_unknown_direction_checks_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let present = tmp.path().join("present");
        std::fs::write(&present, "x").unwrap();
        let absent = tmp.path().join("absent");

        let ev = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Any)))
            .add_path(present)
            .add_path(absent);
        assert_eq!(
            kinds(&ev),
            vec![FileEventKind::Created, FileEventKind::Deleted]
        );
    }

    #[test]
    fn test_access_and_folders_are_dropped() {
        let access = raw(
            EventKind::Access(AccessKind::Close(AccessMode::Write)),
            "/in/a",
        );
        let folder = raw(EventKind::Create(CreateKind::Folder), "/in/sub");
        assert!(classify(&access).is_empty());
        assert!(classify(&folder).is_empty());
    }

    #[test]
    fn test_unclassifiable_is_unknown() {
        assert_eq!(
            kinds(&raw(EventKind::Other, "/in/a")),
            vec![FileEventKind::Unknown]
        );
        assert_eq!(
            kinds(&raw(EventKind::Any, "/in/a")),
            vec![FileEventKind::Unknown]
        );
    }
}
