use std::io::ErrorKind;

use crate::error::{MirrorError, Result};

use super::{DeletionJob, JobHandler, Notice};

/// Removes the report of a deleted input file.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeletionPipeline;

impl DeletionPipeline {
    /// Delete `job.target`.
    ///
    /// A missing report is an inconsistency between input and output and is
    /// reported as [`MirrorError::OutputNotFound`], not treated as success.
    pub fn process(&self, job: &DeletionJob) -> Result<Notice> {
        match std::fs::remove_file(&job.target) {
            Ok(()) => Ok(Notice::deleted(&job.target)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(MirrorError::OutputNotFound {
                path: job.target.clone(),
            }),
            Err(source) => Err(MirrorError::OutputDelete {
                path: job.target.clone(),
                source,
            }),
        }
    }
}

impl JobHandler<DeletionJob> for DeletionPipeline {
    fn handle(&self, job: DeletionJob) -> Result<Notice> {
        self.process(&job)
    }
}
