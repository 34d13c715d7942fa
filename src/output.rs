use clap::ValueEnum;
use serde::Serialize;

use crate::pipeline::Notice;

/// How job notices are written to stdout.
#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum NoticeFormat {
    /// One human-readable line per job, e.g. `out/sales.csv written` (default).
    #[default]
    Text,
    /// One JSON object per line: `{"action":"written","path":"out/sales.csv"}`.
    Json,
}

/// Destination for job notices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeSink {
    Stdout(NoticeFormat),
    /// Notices are dropped; outcomes are still counted and failures logged.
    Silent,
}

impl NoticeSink {
    pub fn emit(&self, notice: &Notice) {
        match self {
            Self::Stdout(NoticeFormat::Text) => println!("{notice}"),
            Self::Stdout(NoticeFormat::Json) => match serde_json::to_string(notice) {
                Ok(s) => println!("{s}"),
                Err(e) => eprintln!("error serialising notice: {e}"),
            },
            Self::Silent => {}
        }
    }
}

/// Aggregate outcome of a mirror run.
#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RunSummary {
    /// Reports written or overwritten.
    pub written: usize,
    /// Reports deleted.
    pub deleted: usize,
    /// Report jobs that failed (read, generation, serialization or write errors).
    pub report_failures: usize,
    /// Deletion jobs that failed (missing report or delete error).
    pub deletion_failures: usize,
    /// Events that could not be classified and produced no job.
    pub unclassified: usize,
}

impl RunSummary {
    pub fn failures(&self) -> usize {
        self.report_failures + self.deletion_failures
    }
}

/// Print a summary of the run.
///
/// - `NoticeFormat::Json`: emit a single JSON object to stdout.
/// - `NoticeFormat::Text`: emit a short human-readable summary to stdout.
///
/// If any job failed, a warning line is written to **stderr** so that
/// the stdout stream remains clean for downstream consumers.
pub fn print_summary(summary: &RunSummary, format: NoticeFormat) {
    match format {
        NoticeFormat::Json => match serde_json::to_string(summary) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("error serialising summary: {e}"),
        },
        NoticeFormat::Text => {
            println!(
                "Mirrored {} reports, deleted {}",
                summary.written, summary.deleted
            );
            if summary.unclassified > 0 {
                println!("  {} unclassified events ignored", summary.unclassified);
            }
        }
    }

    if summary.failures() > 0 {
        eprintln!(
            "  {} jobs failed ({} report, {} deletion)",
            summary.failures(),
            summary.report_failures,
            summary.deletion_failures
        );
    }
}
