use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use report_mirror::config::Overrides;
use report_mirror::output::NoticeFormat;

/// Mirror a directory into JSON reports.
///
/// Every file created or modified in the input directory gets a report of the
/// same name in the output directory; deleting the input file deletes its report.
#[derive(Parser, Debug)]
#[command(
    name = "report-mirror",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the input directory and keep the output directory in sync until Ctrl-C.
    Watch {
        #[command(flatten)]
        common: CommonArgs,

        /// Generate reports for files already present before watching.
        #[arg(long)]
        initial_sync: bool,
    },

    /// Generate reports for every file currently in the input directory, then exit.
    Sync {
        #[command(flatten)]
        common: CommonArgs,

        /// Also delete reports whose input file no longer exists.
        #[arg(long)]
        prune: bool,
    },
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Directory to watch (created if missing).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory receiving the reports (created if missing).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (defaults to ./report-mirror.toml when present).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum concurrent report jobs.
    #[arg(long)]
    pub report_workers: Option<usize>,

    /// Maximum concurrent deletion jobs.
    #[arg(long)]
    pub deletion_workers: Option<usize>,

    /// Bounded queue size of each lane.
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// File-name glob to ignore (repeatable, e.g. --exclude '*.swp').
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Notice format on stdout.
    #[arg(long, value_enum, default_value_t = NoticeFormat::Text)]
    pub format: NoticeFormat,

    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    pub fn overrides(&self, initial_sync: bool) -> Overrides {
        Overrides {
            input_dir: self.input.clone(),
            output_dir: self.output.clone(),
            exclude: self.exclude.clone(),
            report_workers: self.report_workers,
            deletion_workers: self.deletion_workers,
            queue_capacity: self.queue_capacity,
            initial_sync,
        }
    }
}
