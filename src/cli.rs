//! CLI definitions for stage-release
//!
//! This module contains all CLI argument parsing structures using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::plan::OutputFormat;

#[derive(Parser)]
#[command(
    name = "stage-release",
    version,
    about = "Release orchestrator for multi-artifact stage deployments",
    long_about = "Resolves a stage release configuration into typed artifact descriptors,\nselects the release CLI login and plans the upload of every artifact."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Step metadata file replacing the built-in parameter defaults
    #[arg(long, global = true, env = "STAGE_RELEASE_METADATA")]
    pub metadata: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a release configuration and build every artifact descriptor
    Validate {
        /// Step options file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Run the release against the dry-run backend and print the plan
    Plan {
        /// Step options file
        #[arg(short, long)]
        config: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        output: OutputFormat,
    },
}
