use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::{MirrorError, Result};

/// A path known to exist and to be a directory.
///
/// Built only through [`WatchedDirectory::ensure`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedDirectory {
    path: PathBuf,
}

impl WatchedDirectory {
    /// Validate `path`, creating it (with parents) when it does not exist.
    ///
    /// Fails with [`MirrorError::InvalidPathKind`] when something other than a
    /// directory already sits at `path`. Idempotent for existing directories.
    pub fn ensure(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        reject_non_directory(path)?;

        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|source| MirrorError::DirectoryCreation {
                path: path.to_path_buf(),
                source,
            })?;
        }

        // Absolute form so that watcher events (always absolute) compare equal.
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path inside this directory carrying the same base name as `source`.
    ///
    /// Returns `None` when `source` has no file name (e.g. `/` or `..`).
    pub fn target_for(&self, source: &Path) -> Option<PathBuf> {
        source.file_name().map(|name| self.path.join(name))
    }

    /// Path inside this directory for a bare file name.
    pub fn join(&self, name: &OsStr) -> PathBuf {
        self.path.join(name)
    }
}

impl AsRef<Path> for WatchedDirectory {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

fn reject_non_directory(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        return Err(MirrorError::InvalidPathKind {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Validate both directories and reject configurations where they coincide.
///
/// Both paths are checked before either is created.
pub fn ensure_pair(input: &Path, output: &Path) -> Result<(WatchedDirectory, WatchedDirectory)> {
    reject_non_directory(input)?;
    reject_non_directory(output)?;

    let input = WatchedDirectory::ensure(input)?;
    let output = WatchedDirectory::ensure(output)?;

    if input.path() == output.path() {
        return Err(MirrorError::SameDirectory {
            path: input.path().to_path_buf(),
        });
    }

    Ok((input, output))
}
