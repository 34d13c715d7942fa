//! Error types for report-mirror.
//!
//! Startup errors (directory validation, configuration, watch setup) abort the
//! process. Job errors are isolated to the job that raised them: they are
//! logged once by the lane and never stop the watcher.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, MirrorError>;

/// Error returned by a [`crate::generator::ReportGenerator`].
pub type GeneratorError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("{path} must not be a regular file")]
    InvalidPathKind { path: PathBuf },

    #[error("failed to create directory {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input and output directories must differ (both resolve to {path})")]
    SameDirectory { path: PathBuf },

    #[error("failed to watch {path}: {source}")]
    WatchStart {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("lost watch on {path}")]
    WatchLost { path: PathBuf },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing setting `{name}` (pass --{flag} or set it in the config file)")]
    MissingSetting {
        name: &'static str,
        flag: &'static str,
    },

    #[error("invalid exclude pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to read {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report generation failed for {path}: {source}")]
    ReportGeneration {
        path: PathBuf,
        #[source]
        source: GeneratorError,
    },

    #[error("failed to serialize report for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} does not exist, nothing to delete")]
    OutputNotFound { path: PathBuf },

    #[error("failed to delete {path}: {source}")]
    OutputDelete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid event for {path}: change could not be classified")]
    UnclassifiedEvent { path: PathBuf },

    #[error("{lane} lane is closed")]
    LaneClosed { lane: &'static str },
}

impl MirrorError {
    /// Path the error refers to, when there is one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::InvalidPathKind { path }
            | Self::DirectoryCreation { path, .. }
            | Self::SameDirectory { path }
            | Self::WatchStart { path, .. }
            | Self::WatchLost { path }
            | Self::ConfigRead { path, .. }
            | Self::ConfigParse { path, .. }
            | Self::SourceRead { path, .. }
            | Self::ReportGeneration { path, .. }
            | Self::Serialize { path, .. }
            | Self::OutputWrite { path, .. }
            | Self::OutputNotFound { path }
            | Self::OutputDelete { path, .. }
            | Self::UnclassifiedEvent { path } => Some(path),
            Self::MissingSetting { .. } | Self::InvalidPattern { .. } | Self::LaneClosed { .. } => {
                None
            }
        }
    }
}
