//! LightFPS - page-mutation engine for media-heavy sites
//!
//! Main entry point for the LightFPS CLI.

mod cli;
mod cmd_optimize;
mod cmd_settings;

use std::path::Path;

use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::cmd_optimize::handle_optimize;
use crate::cmd_settings::{handle_presets, handle_settings_command};

/// Initialize tracing: console output on stderr, plus daily JSON log files
/// when `log_dir` is given.
///
/// `RUST_LOG` overrides the default `info` filter.
fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let file = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("lightfps")
                .filename_suffix("log")
                .max_log_files(7)
                .build(dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            // Keeps the writer thread alive for the whole run.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().json().with_writer(non_blocking))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Optimize(args) => handle_optimize(args),
        Commands::Settings { action } => handle_settings_command(action).await,
        Commands::Presets { config } => handle_presets(config.as_deref()),
    }
}
