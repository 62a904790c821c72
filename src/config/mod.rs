//! # Release Configuration
//!
//! Two-layer configuration: step options → per-artifact overrides
//!
//! ## Layers
//!
//! 1. **Step options** (the `--config` YAML file)
//!    - Global settings shared by every artifact (artifact URLs, version,
//!      gateway/Themisto login, stage watch policy, Helm chart directory)
//!    - Single-artifact fields used when no `artifacts` list is given
//!
//! 2. **Artifacts** (`artifacts:` list inside the same file)
//!    - One entry per release unit, decoded into [`ArtifactConfiguration`]
//!    - Unset fields inherit from the step options (see `domain::resolver`)
//!
//! Absent top-level keys are filled from [`StepMetadata`] defaults before
//! decoding.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let metadata = StepMetadata::load(None)?;
//! let options = load_step_options(Path::new("release.yaml"), &metadata)?;
//! println!("Watch policy: {}", options.global.stage_watch_policy);
//! ```

mod artifact;
mod global;
mod metadata;

pub use artifact::{
    App, ArtifactConfiguration, ArtifactType, UploadType, SELECTIVE_MTA_MODULE_DEPLOYMENT_KEY,
};
pub use global::{DeriveAdditionalDownloadUrlsEntry, GlobalConfiguration};
pub use metadata::{DefaultLookup, ParameterDefinition, ParameterKind, StepMetadata};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Raw artifact entry, decoded into [`ArtifactConfiguration`] during resolution
pub type RawArtifact = Map<String, Value>;

/// Complete step options as read from the configuration file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StepOptions {
    /// Global settings
    #[serde(flatten)]
    pub global: GlobalConfiguration,

    /// Single-artifact fields, also the inheritance source for listed artifacts
    #[serde(flatten)]
    pub artifact: ArtifactConfiguration,

    /// Explicit artifact list
    #[serde(default)]
    pub artifacts: Vec<RawArtifact>,
}

/// Load step options from a YAML file
pub fn load_step_options(path: &Path, metadata: &StepMetadata) -> Result<StepOptions> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_step_options(&content, metadata)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse step options, filling absent keys from metadata defaults
pub fn parse_step_options(content: &str, metadata: &StepMetadata) -> Result<StepOptions> {
    let mut raw: Map<String, Value> =
        serde_yaml::from_str(content).context("Step options must be a YAML mapping")?;
    metadata.apply_defaults(&mut raw);
    serde_json::from_value(Value::Object(raw)).context("Invalid step options")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_step_options_splits_layers() {
        let metadata = StepMetadata::builtin().unwrap();
        let yaml = r#"
artifactVersion: "1.2.3"
projectName: shop
appName: backend
artifacts:
  - resourceName: backend
    artifactType: maven
  - resourceName: ui
    uploadType: ui
"#;
        let options = parse_step_options(yaml, &metadata).unwrap();

        assert_eq!(options.global.artifact_version, "1.2.3");
        assert_eq!(options.global.project_name, "shop");
        assert_eq!(options.global.helm_chart_directory, "helm");
        assert_eq!(options.global.stage_watch_policy, "overallSuccess");
        assert_eq!(options.artifact.app_name, "backend");
        assert_eq!(options.artifact.upload_type, "service");
        assert_eq!(options.artifact.artifact_files_to_upload, vec!["cf", "helm"]);
        assert_eq!(options.artifacts.len(), 2);
        assert_eq!(options.artifacts[1]["uploadType"], Value::from("ui"));
    }

    #[test]
    fn test_parse_step_options_rejects_non_mapping() {
        let metadata = StepMetadata::builtin().unwrap();
        assert!(parse_step_options("- just\n- a list\n", &metadata).is_err());
    }
}
