mod commands;
mod logging;
mod views;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use shiori_core::config::AppConfig;
use shiori_core::ShioriError;

/// Browse, search and bookmark anime from Kitsu.
#[derive(Parser, Debug)]
#[command(name = "shiori", version)]
struct Cli {
    /// Config file path (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_dir = if config.logging.file {
        match config.ensure_data_dir() {
            Ok(dir) => Some(dir.join("logs")),
            Err(e) => {
                eprintln!("warning: file logging disabled: {e}");
                None
            }
        }
    } else {
        None
    };
    let _guard = logging::init(&config.logging, cli.verbose, log_dir);
    tracing::debug!(base_url = %config.api.base_url, "config loaded");

    match commands::run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig, ShioriError> {
    match path {
        Some(path) => AppConfig::load_from(&path),
        None => AppConfig::load(),
    }
}
