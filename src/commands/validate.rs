//! Validate command
//!
//! Resolves and validates a release configuration, selects the login
//! strategy and builds every artifact descriptor without installing the CLI,
//! extracting archives or uploading anything.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::{load_inputs, local_collaborators};
use crate::infrastructure::{EnvironmentResourceNames, ProcessEnvironment};
use crate::services::{DryRunBackend, ReleaseService};
use crate::ui;

/// Execute validate command
pub fn execute(config: &Path, metadata: Option<&Path>) -> Result<()> {
    ui::print_config_title(config);
    let (metadata, options) = load_inputs(config, metadata)?;
    debug!("Loaded {} metadata parameter(s)", metadata.parameters.len());

    let resource_names = EnvironmentResourceNames::new(&ProcessEnvironment);
    let service = ReleaseService::new(local_collaborators(&metadata, &resource_names), DryRunBackend::new());

    let check = service
        .check(&options)
        .with_context(|| format!("{} is not a valid release configuration", config.display()))?;

    ui::print_login(&check.login);
    for descriptor in &check.artifacts {
        ui::print_artifact(descriptor);
    }
    ui::print_ready(check.artifacts.len());
    Ok(())
}
