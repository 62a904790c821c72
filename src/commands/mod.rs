//! Command implementations
//!
//! Each command loads the step metadata and options, wires the release
//! service to the local process and file system, and reports the result.

pub mod plan;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use crate::config::{load_step_options, StepMetadata, StepOptions};
use crate::domain::PromotedImageResolver;
use crate::infrastructure::{EnvironmentResourceNames, LocalFileSystem, ProcessEnvironment};
use crate::services::Collaborators;

/// Load the step metadata (built-in unless overridden) and the options file
pub(crate) fn load_inputs(config: &Path, metadata: Option<&Path>) -> Result<(StepMetadata, StepOptions)> {
    let metadata = StepMetadata::load(metadata)?;
    let options = load_step_options(config, &metadata)?;
    Ok((metadata, options))
}

/// Collaborators backed by the running process
pub(crate) fn local_collaborators<'a>(
    metadata: &'a StepMetadata,
    resource_names: &'a EnvironmentResourceNames<'a>,
) -> Collaborators<'a> {
    Collaborators {
        defaults: metadata,
        resource_names,
        images: &PromotedImageResolver,
        environment: &ProcessEnvironment,
        orchestrator: &ProcessEnvironment,
        files: &LocalFileSystem,
    }
}
