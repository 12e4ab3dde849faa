//! IIIF manga viewer
//!
//! Main entry point: a line-driven viewer over a remote IIIF manifest.

mod app;

use anyhow::Result;
use app_core::AppConfig;
use clap::Parser;
use std::path::PathBuf;

/// Read a IIIF manifest page by page, right to left
#[derive(Debug, Parser)]
#[command(name = "manga_viewer", version, about)]
struct Args {
    /// Manifest URL; overrides `viewer.manifest` from the config file
    #[arg(short, long)]
    manifest: Option<String>,

    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log to the console as well as the log file
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(AppConfig::config_path);
    let mut config = AppConfig::load_from(&config_path)?;
    if let Some(manifest) = args.manifest {
        config.viewer.manifest = Some(manifest);
    }

    // Initialize logging and panic hook first
    let _log_guard = app_log::init(&app_log::LogConfig {
        level: config.general.log_level.clone(),
        directory: Some(app_log::log_dir()),
        console: args.verbose || cfg!(debug_assertions),
    })?;

    match app_log::cleanup_old_logs(&app_log::log_dir(), config.general.log_retention_days) {
        Ok(0) => {}
        Ok(n) => tracing::debug!(removed = n, "old logs cleaned up"),
        Err(e) => tracing::warn!("Failed to cleanup old logs: {}", e),
    }

    tracing::info!(config = ?config_path, "manga viewer starting");

    // One thread: page loads interleave on a single cooperative scheduler.
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(app::run(config))
}
