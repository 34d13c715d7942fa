//! Logging prelude: re-exports the tracing macros used across the crate and
//! installs the subscriber for the binary.
//!
//! Logs always go to stderr so that stdout carries only job notices.
//!
//! ```bash
//! RUST_LOG=debug report-mirror watch --input in --output out
//! RUST_LOG=report_mirror::watcher=trace report-mirror watch --input in --output out
//! ```

pub use tracing::{debug, error, info, warn};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug` when
/// `verbose` is true.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
