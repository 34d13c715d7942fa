//! Job types and the two job processors behind the report and deletion lanes.

pub mod deletion;
pub mod report;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;

pub use deletion::DeletionPipeline;
pub use report::ReportPipeline;

/// Regenerate the report of `source` into `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportJob {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// Remove the report at `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionJob {
    pub target: PathBuf,
}

/// Something a job is able to process. Called on the blocking thread pool.
pub trait JobHandler<J>: Send + Sync + 'static {
    fn handle(&self, job: J) -> Result<Notice>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeAction {
    Written,
    Deleted,
}

/// Completion record of one successful job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub action: NoticeAction,
    pub path: PathBuf,
}

impl Notice {
    pub fn written(path: impl Into<PathBuf>) -> Self {
        Self {
            action: NoticeAction::Written,
            path: path.into(),
        }
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self {
            action: NoticeAction::Deleted,
            path: path.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.action {
            NoticeAction::Written => "written",
            NoticeAction::Deleted => "deleted",
        };
        write!(f, "{} {}", self.path.display(), action)
    }
}
