//! # report-mirror
//!
//! Keeps an output directory in step with an input directory: each input
//! file has a JSON report of the same name in the output directory.
//!
//! ```text
//! watcher ──► router ──┬─► report lane   ──► read → generate → atomic write
//!                      └─► deletion lane ──► remove report
//! ```
//!
//! The report itself comes from a pluggable [`ReportGenerator`]; the crate
//! ships [`generator::FileStats`] as a default.
//!
//! ```rust,ignore
//! use report_mirror::{Mirror, Settings, generator::FileStats, output::NoticeSink};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mirror = Mirror::new(Settings::new("in", "out"), FileStats, NoticeSink::Silent)?;
//!     let summary = mirror.start()?.run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }).await?;
//!     println!("{} reports written", summary.written);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod exclude;
pub mod generator;
pub mod lane;
pub mod logging;
pub mod mirror;
pub mod output;
pub mod pipeline;
pub mod router;
pub mod watcher;

pub use config::Settings;
pub use directory::WatchedDirectory;
pub use error::{MirrorError, Result};
pub use generator::ReportGenerator;
pub use mirror::{Mirror, MirrorHandle};
pub use watcher::event::{FileEvent, FileEventKind};
