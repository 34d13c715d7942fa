use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::error::{MirrorError, Result};
use crate::generator::ReportGenerator;

use super::{JobHandler, Notice, ReportJob};

/// Read → generate → serialize → atomic write.
pub struct ReportPipeline<G> {
    generator: Arc<G>,
}

impl<G: ReportGenerator> ReportPipeline<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self { generator }
    }

    /// Produce the report for `job.source` and store it at `job.target`.
    ///
    /// Nothing under the output directory changes unless every step succeeds:
    /// a read, generation or serialization failure leaves any previous report
    /// in place, and the write itself is staged then renamed.
    pub fn process(&self, job: &ReportJob) -> Result<Notice> {
        let content = std::fs::read(&job.source).map_err(|source| MirrorError::SourceRead {
            path: job.source.clone(),
            source,
        })?;

        let report = self
            .generator
            .generate(&job.source, &content)
            .map_err(|source| MirrorError::ReportGeneration {
                path: job.source.clone(),
                source,
            })?;

        let json = serde_json::to_vec(&report).map_err(|source| MirrorError::Serialize {
            path: job.source.clone(),
            source,
        })?;

        write_atomic(&job.target, &json)?;
        Ok(Notice::written(&job.target))
    }
}

impl<G: ReportGenerator> JobHandler<ReportJob> for ReportPipeline<G> {
    fn handle(&self, job: ReportJob) -> Result<Notice> {
        self.process(&job)
    }
}

/// Write `bytes` to `target` atomically.
///
/// Writes to a temp file in the target's directory first, then renames over
/// the final path, so readers see either the old or the new content.
///
/// A new report gets mode `0o644` minus the umask, like a plain file create.
/// An existing report keeps its mode.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let write_err = |source| MirrorError::OutputWrite {
        path: target.to_path_buf(),
        source,
    };

    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o644));
    }
    let mut tmp = builder.tempfile_in(dir).map_err(write_err)?;
    if let Ok(existing) = std::fs::metadata(target) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(write_err)?;
    }
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(target).map_err(|e| write_err(e.error))?;

    Ok(())
}
