//! Per-artifact release configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Upload metadata key marking an MTA whose UI modules are released separately
pub const SELECTIVE_MTA_MODULE_DEPLOYMENT_KEY: &str = "selectiveModuleDeployment";

/// Channel an artifact is published through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadType {
    Service,
    Ui,
    Orbit,
}

impl UploadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Ui => "ui",
            Self::Orbit => "orbit",
        }
    }
}

impl FromStr for UploadType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service" => Ok(Self::Service),
            "ui" => Ok(Self::Ui),
            "orbit" => Ok(Self::Orbit),
            _ => Err(ConfigError::UnsupportedUploadType {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for UploadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Technology-specific payload kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactType {
    Java,
    Maven,
    Mta,
    MavenMta,
    Docker,
    DockerBuildReleaseMetadata,
    Helm,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Maven => "maven",
            Self::Mta => "mta",
            Self::MavenMta => "maven-mta",
            Self::Docker => "docker",
            Self::DockerBuildReleaseMetadata => "dockerbuild-releaseMetadata",
            Self::Helm => "helm",
        }
    }

    /// Default glob selecting this type's file from the artifact URLs
    pub fn default_url_pattern(&self, repository: &str) -> String {
        match self {
            Self::Java | Self::Maven => format!("**/{}/**/*.jar", repository),
            Self::Mta | Self::MavenMta => format!("**/{}/**/*.mtar", repository),
            _ => format!("**/{}/**/*", repository),
        }
    }
}

impl FromStr for ArtifactType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "java" => Ok(Self::Java),
            "maven" => Ok(Self::Maven),
            "mta" => Ok(Self::Mta),
            "maven-mta" => Ok(Self::MavenMta),
            "docker" => Ok(Self::Docker),
            "dockerbuild-releaseMetadata" => Ok(Self::DockerBuildReleaseMetadata),
            "helm" => Ok(Self::Helm),
            _ => Err(ConfigError::UnsupportedArtifactType {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named application deployed from one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct App {
    pub name: String,
    pub no_euporie_task_collection: bool,
    pub no_route_assignment: bool,
    pub allow_static_routes: bool,
}

/// One release unit
///
/// An empty string or `false` counts as "not set" and is inherited from the
/// step options. Lists are inherited only when their key is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ArtifactConfiguration {
    pub app_name: String,
    pub apps: Vec<App>,
    pub archive_pattern: String,
    pub artifact_files_to_upload: Vec<String>,
    /// Regex selecting the artifact URL, overrides the repository-based glob
    pub artifact_pattern: String,
    pub artifact_type: String,
    #[serde(rename = "extractFromMTA")]
    pub extract_from_mta: bool,
    pub has_archive: bool,
    pub helm_values: Vec<String>,
    pub overwrite_helm_docker_image: bool,
    pub promoted_docker_image: String,
    pub repository: String,
    pub resource_name: String,
    pub ui_upload_base_path: String,
    /// `key=value` entries
    pub upload_metadata: Vec<String>,
    pub upload_type: String,
}

impl ArtifactConfiguration {
    pub fn upload_type(&self) -> Result<UploadType, ConfigError> {
        self.upload_type.parse()
    }

    /// Parsed artifact type, `None` when unset
    pub fn artifact_type(&self) -> Result<Option<ArtifactType>, ConfigError> {
        if self.artifact_type.is_empty() {
            return Ok(None);
        }
        self.artifact_type.parse().map(Some)
    }

    pub fn is_ui(&self) -> bool {
        self.upload_type == UploadType::Ui.as_str()
    }

    pub fn is_artifact_type(&self, artifact_type: ArtifactType) -> bool {
        self.artifact_type == artifact_type.as_str()
    }

    /// The single app name of this artifact, either `appName` or the only entry of `apps`
    pub fn unique_app_name(&self) -> Option<&str> {
        if !self.app_name.is_empty() {
            return Some(&self.app_name);
        }
        match self.apps.as_slice() {
            [app] => Some(&app.name),
            _ => None,
        }
    }
}
