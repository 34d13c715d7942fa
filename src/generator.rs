use std::path::Path;

use serde::Serialize;

use crate::error::GeneratorError;

/// Turns the raw content of one input file into a report.
///
/// Implementations are called from the blocking thread pool and may be slow.
/// They must be safe to call concurrently for different files.
pub trait ReportGenerator: Send + Sync + 'static {
    type Report: Serialize;

    /// Build the report for `content`, read from `path`.
    fn generate(&self, path: &Path, content: &[u8]) -> Result<Self::Report, GeneratorError>;
}

/// Built-in generator used by the binary: basic size and text statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStats;

/// Report produced by [`FileStats`].
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FileStatsReport {
    pub file_name: String,
    pub bytes: u64,
    pub lines: usize,
    pub blank_lines: usize,
    pub words: usize,
    /// Whether the content is valid UTF-8. Non-UTF-8 content is counted lossily.
    pub utf8: bool,
}

impl ReportGenerator for FileStats {
    type Report = FileStatsReport;

    fn generate(&self, path: &Path, content: &[u8]) -> Result<FileStatsReport, GeneratorError> {
        let utf8 = std::str::from_utf8(content).is_ok();
        let text = String::from_utf8_lossy(content);

        let mut lines = 0;
        let mut blank_lines = 0;
        for line in text.lines() {
            lines += 1;
            if line.trim().is_empty() {
                blank_lines += 1;
            }
        }

        Ok(FileStatsReport {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            bytes: content.len() as u64,
            lines,
            blank_lines,
            words: text.split_whitespace().count(),
            utf8,
        })
    }
}
