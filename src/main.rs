use anyhow::Result;
use clap::Parser;
use tracing::error;

mod cli;
mod commands;
mod config;
mod domain;
mod error;
mod infrastructure;
mod services;
mod tools;
mod ui;

use cli::{Cli, Commands};
use commands::{plan, validate};
use error::ReleaseError;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .init();

    let metadata = cli.metadata.as_deref();
    let result = match &cli.command {
        Commands::Validate { config } => validate::execute(config, metadata),
        Commands::Plan { config, output } => plan::execute(config, metadata, *output),
    };

    if let Err(e) = &result {
        if let Some(release_error) = e.downcast_ref::<ReleaseError>() {
            error!("release failed with {} error", release_error.category());
        }
    }
    result
}
