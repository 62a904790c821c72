//! Validation of resolved configurations
//!
//! Runs after resolution and before any archive, login or upload work.
//! The first violation aborts the run.

use std::collections::HashSet;

use crate::config::{App, ArtifactConfiguration, ArtifactType, DefaultLookup, GlobalConfiguration, UploadType};
use crate::error::ConfigError;

/// Validate the global configuration and every artifact
pub fn validate(
    global: &GlobalConfiguration,
    artifacts: &[ArtifactConfiguration],
    defaults: &dyn DefaultLookup,
) -> Result<(), ConfigError> {
    validate_mandatory_parameters(global, defaults)?;
    validate_artifacts(artifacts)
}

/// Every mandatory string parameter must be non-empty
///
/// Names that are not string fields of the global configuration are skipped.
pub fn validate_mandatory_parameters(
    global: &GlobalConfiguration,
    defaults: &dyn DefaultLookup,
) -> Result<(), ConfigError> {
    for name in defaults.mandatory_string_parameters() {
        if global.string_parameter(&name) == Some("") {
            return Err(ConfigError::MissingParameter { name });
        }
    }
    Ok(())
}

pub fn validate_artifacts(artifacts: &[ArtifactConfiguration]) -> Result<(), ConfigError> {
    let mut resource_names = HashSet::new();

    for artifact in artifacts {
        match artifact.upload_type()? {
            UploadType::Service => {
                artifact.artifact_type()?.ok_or_else(|| ConfigError::UnsupportedArtifactType {
                    value: artifact.artifact_type.clone(),
                })?;
            }
            UploadType::Orbit => {
                let allowed = artifact.artifact_type.is_empty()
                    || artifact.is_artifact_type(ArtifactType::Docker)
                    || artifact.is_artifact_type(ArtifactType::DockerBuildReleaseMetadata);
                if !allowed {
                    return Err(ConfigError::ArtifactTypeNotAllowed {
                        artifact_type: artifact.artifact_type.clone(),
                        upload_type: UploadType::Orbit.to_string(),
                    });
                }
            }
            UploadType::Ui => {
                if !artifact.artifact_type.is_empty() {
                    return Err(ConfigError::ArtifactTypeNotAllowed {
                        artifact_type: artifact.artifact_type.clone(),
                        upload_type: UploadType::Ui.to_string(),
                    });
                }
            }
        }

        if artifact.resource_name.is_empty() {
            return Err(ConfigError::MissingResourceName {
                artifact_type: artifact.artifact_type.clone(),
            });
        }
        if !resource_names.insert(artifact.resource_name.as_str()) {
            return Err(ConfigError::DuplicateResourceName {
                name: artifact.resource_name.clone(),
            });
        }

        if !artifact.is_ui() {
            validate_app_names(&artifact.app_name, &artifact.apps).map_err(|reason| {
                ConfigError::InvalidAppNames {
                    resource: artifact.resource_name.clone(),
                    reason,
                }
            })?;
        }

        // MTAs are uploaded as-is
        if artifact.artifact_files_to_upload.is_empty() && !artifact.is_artifact_type(ArtifactType::Mta) {
            return Err(ConfigError::NoFilesToUpload {
                resource: artifact.resource_name.clone(),
            });
        }

        if artifact.is_ui() && artifact.has_archive && artifact.archive_pattern.is_empty() {
            return Err(ConfigError::MissingArchivePattern {
                resource: artifact.resource_name.clone(),
            });
        }
    }
    Ok(())
}

/// Exactly one of `appName` and `apps`, with unique non-empty app names
fn validate_app_names(app_name: &str, apps: &[App]) -> Result<(), String> {
    match (app_name.is_empty(), apps.is_empty()) {
        (true, true) => {
            return Err(
                "neither parameter appName nor apps is set, however, providing one of them is mandatory".to_string(),
            )
        }
        (false, false) => {
            return Err(
                "both parameters appName and apps are set, however, only one of them can be provided".to_string(),
            )
        }
        _ => {}
    }

    let mut names = HashSet::new();
    for app in apps {
        if app.name.is_empty() {
            return Err("name is not set for at least one app in config list".to_string());
        }
        if !names.insert(app.name.as_str()) {
            return Err(format!("duplicate app name found: {}", app.name));
        }
    }
    Ok(())
}
