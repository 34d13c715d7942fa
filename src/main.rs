mod cli;

use anyhow::{Context, Result};
use clap::Parser;

use report_mirror::Mirror;
use report_mirror::config::{MirrorConfig, Settings};
use report_mirror::generator::FileStats;
use report_mirror::logging::{error, info, init_tracing};
use report_mirror::output::{NoticeSink, print_summary};

use cli::{Cli, CommonArgs, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            common,
            initial_sync,
        } => {
            init_tracing(common.verbose);
            let settings = resolve_settings(&common, initial_sync)?;
            let mirror = Mirror::new(settings, FileStats, NoticeSink::Stdout(common.format))
                .context("invalid startup configuration")?;

            let handle = mirror.start()?;
            let summary = handle
                .run_until(async {
                    if let Err(err) = tokio::signal::ctrl_c().await {
                        error!("failed to listen for Ctrl-C: {err}");
                        std::future::pending::<()>().await;
                    }
                    info!("shutting down, draining queued jobs");
                })
                .await?;
            print_summary(&summary, common.format);
        }
        Commands::Sync { common, prune } => {
            init_tracing(common.verbose);
            let settings = resolve_settings(&common, false)?;
            let mirror = Mirror::new(settings, FileStats, NoticeSink::Stdout(common.format))
                .context("invalid startup configuration")?;

            let summary = mirror.sync(prune).await?;
            print_summary(&summary, common.format);
            if summary.failures() > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn resolve_settings(common: &CommonArgs, initial_sync: bool) -> Result<Settings> {
    let config = match &common.config {
        Some(path) => MirrorConfig::load_from(path)?,
        None => {
            let cwd = std::env::current_dir().context("cannot determine current directory")?;
            MirrorConfig::load_implicit(&cwd)
        }
    };
    Ok(Settings::resolve(config, common.overrides(initial_sync))?)
}
