use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{MirrorError, Result};
use crate::logging::warn;

/// Config file looked up in the current directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "report-mirror.toml";

/// Bounded queue size per lane unless configured otherwise.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Concurrent deletion jobs unless configured otherwise.
pub const DEFAULT_DELETION_WORKERS: usize = 2;

/// Configuration loaded from `report-mirror.toml`.
///
/// Every field is optional; command-line flags override whatever is set here.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MirrorConfig {
    /// Directory whose files are watched.
    pub input_dir: Option<PathBuf>,
    /// Directory receiving one JSON report per input file.
    pub output_dir: Option<PathBuf>,
    /// File-name glob patterns that never produce events.
    pub exclude: Option<Vec<String>>,
    /// Concurrent report jobs.
    pub report_workers: Option<usize>,
    /// Concurrent deletion jobs.
    pub deletion_workers: Option<usize>,
    /// Bounded queue size of each lane.
    pub queue_capacity: Option<usize>,
    /// Generate reports for files already present when `watch` starts.
    pub initial_sync: Option<bool>,
}

impl MirrorConfig {
    /// Load configuration from an explicit file. Any failure is fatal.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| MirrorError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| MirrorError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `report-mirror.toml` from `dir`.
    ///
    /// Returns a default (empty) configuration if the file does not exist or cannot be parsed.
    pub fn load_implicit(dir: &Path) -> Self {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(err) => {
                warn!("{err}. Using defaults.");
                Self::default()
            }
        }
    }
}

/// Values given on the command line; `None` defers to the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub exclude: Vec<String>,
    pub report_workers: Option<usize>,
    pub deletion_workers: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub initial_sync: bool,
}

/// Fully resolved settings the mirror runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub exclude: Vec<String>,
    pub report_workers: usize,
    pub deletion_workers: usize,
    pub queue_capacity: usize,
    pub initial_sync: bool,
}

impl Settings {
    /// Settings with defaults for everything but the two directories.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            exclude: Vec::new(),
            report_workers: default_report_workers(),
            deletion_workers: DEFAULT_DELETION_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            initial_sync: false,
        }
    }

    /// Merge command-line overrides on top of the file configuration.
    ///
    /// Exclusion patterns from both sources are combined. Worker counts and
    /// queue capacity are clamped to at least one.
    pub fn resolve(config: MirrorConfig, overrides: Overrides) -> Result<Self> {
        let input_dir = overrides
            .input_dir
            .or(config.input_dir)
            .ok_or(MirrorError::MissingSetting {
                name: "input_dir",
                flag: "input",
            })?;
        let output_dir = overrides
            .output_dir
            .or(config.output_dir)
            .ok_or(MirrorError::MissingSetting {
                name: "output_dir",
                flag: "output",
            })?;

        let mut exclude = config.exclude.unwrap_or_default();
        exclude.extend(overrides.exclude);

        Ok(Self {
            input_dir,
            output_dir,
            exclude,
            report_workers: overrides
                .report_workers
                .or(config.report_workers)
                .unwrap_or_else(default_report_workers)
                .max(1),
            deletion_workers: overrides
                .deletion_workers
                .or(config.deletion_workers)
                .unwrap_or(DEFAULT_DELETION_WORKERS)
                .max(1),
            queue_capacity: overrides
                .queue_capacity
                .or(config.queue_capacity)
                .unwrap_or(DEFAULT_QUEUE_CAPACITY)
                .max(1),
            initial_sync: overrides.initial_sync || config.initial_sync.unwrap_or(false),
        })
    }
}

fn default_report_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
