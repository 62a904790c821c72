//! Plan command
//!
//! Runs the full release workflow against the dry-run backend and prints the
//! resulting login, descriptors and output ids.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use super::{load_inputs, local_collaborators};
use crate::domain::{ArtifactDescriptor, LoginDescriptor};
use crate::infrastructure::{EnvironmentResourceNames, ProcessEnvironment};
use crate::services::{CliTarget, DryRunBackend, ReleaseOutput, ReleaseService};

/// Output format for the plan command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Everything a release run would hand to the release CLI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli: Option<CliTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<LoginDescriptor>,
    pub artifacts: Vec<ArtifactDescriptor>,
    pub output: ReleaseOutput,
}

impl ReleasePlan {
    fn new(backend: DryRunBackend, output: ReleaseOutput) -> Self {
        Self {
            cli: backend.cli,
            login: backend.login,
            artifacts: backend.descriptors,
            output,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Yaml => serde_yaml::to_string(self).context("Failed to render plan as YAML"),
            OutputFormat::Json => serde_json::to_string_pretty(self).context("Failed to render plan as JSON"),
        }
    }
}

/// Execute plan command
pub fn execute(config: &Path, metadata: Option<&Path>, format: OutputFormat) -> Result<()> {
    let (metadata, options) = load_inputs(config, metadata)?;

    let resource_names = EnvironmentResourceNames::new(&ProcessEnvironment);
    let mut service =
        ReleaseService::new(local_collaborators(&metadata, &resource_names), DryRunBackend::new());

    let output = service
        .execute(&options)
        .with_context(|| format!("Release plan for {} failed", config.display()))?;

    let plan = ReleasePlan::new(service.into_backend(), output);
    println!("{}", plan.render(format)?);
    Ok(())
}
