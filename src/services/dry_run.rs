//! Dry-run release backend
//!
//! Logs and records what a release would do without invoking the release CLI.

use std::path::PathBuf;

use tracing::{info, warn};

use super::release_service::{CliSession, CliTarget, UploadController, UploadResponse};
use crate::domain::{ArtifactDescriptor, LoginDescriptor};
use crate::tools::{get_tool_path, locate_tool, RELEASE_CLI};

/// Backend that records the login and every descriptor
#[derive(Debug, Default)]
pub struct DryRunBackend {
    pub cli: Option<CliTarget>,
    pub login: Option<LoginDescriptor>,
    pub descriptors: Vec<ArtifactDescriptor>,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CliSession for DryRunBackend {
    fn install(&mut self, _github_token: &str) -> anyhow::Result<CliTarget> {
        let binary = match locate_tool(RELEASE_CLI) {
            Ok(path) => path,
            Err(e) => {
                warn!("{:#}", e);
                PathBuf::from(get_tool_path(RELEASE_CLI))
            }
        };
        info!("Would use release CLI {}", binary.display());
        Ok(CliTarget::new(binary))
    }

    fn login(&mut self, cli: &CliTarget, login: &LoginDescriptor) -> anyhow::Result<()> {
        // Renders the arguments so incomplete descriptors fail like a real login
        let args = login.login_args()?;
        info!(
            "Would run {} {} ({} arguments)",
            cli.binary.display(),
            args[..2].join(" "),
            args.len()
        );
        self.cli = Some(cli.clone());
        self.login = Some(login.clone());
        Ok(())
    }
}

impl UploadController for DryRunBackend {
    fn upload(&mut self, cli: &CliTarget, descriptor: &ArtifactDescriptor) -> anyhow::Result<UploadResponse> {
        let base = descriptor.base();
        info!(
            "Would upload {} artifact {} with {} via {}",
            descriptor.kind(),
            base.resource_name,
            if descriptor.needs_file_bundling() {
                base.file_patterns.join(", ")
            } else {
                "no file bundle".to_string()
            },
            cli.binary.display()
        );
        self.descriptors.push(descriptor.clone());
        Ok(UploadResponse {
            id: format!("dry-run:{}", base.resource_name),
        })
    }
}
