//! Configuration resolution
//!
//! Merges the step options and the explicit artifact list into the final,
//! fully defaulted list of [`ArtifactConfiguration`]s.
//!
//! Listed artifacts inherit a step option only while that option still holds
//! its metadata default, so an option the user set on purpose for the
//! implicit artifact never leaks into artifacts that leave the field unset.
//! The implicit artifact (no `artifacts` list) copies every option.
//!
//! A string or flag is unset when it holds its zero value. A list is unset
//! only when its key is absent, so an explicit `[]` is kept as written.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{
    ArtifactConfiguration, ArtifactType, DefaultLookup, GlobalConfiguration, RawArtifact, StepOptions,
    SELECTIVE_MTA_MODULE_DEPLOYMENT_KEY,
};
use crate::error::{ConfigError, ExternalResolutionError, ReleaseError};

/// Source of the resource name used when none is configured
pub trait ResourceNameResolver {
    fn resolve_default_resource_name(&self) -> Result<String, ExternalResolutionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inheritance {
    /// Inherit only options still equal to their metadata default
    DefaultsOnly,
    /// Inherit every option
    Unconditional,
}

/// Per-field inheritance from the step options into an artifact
struct FieldMerger<'a> {
    defaults: &'a dyn DefaultLookup,
    inheritance: Inheritance,
    /// Raw entry of a listed artifact, used to tell `[]` from an absent list
    raw: Option<&'a RawArtifact>,
}

impl FieldMerger<'_> {
    fn inherit<T>(&self, name: &str, target: &mut T, option: &T)
    where
        T: Clone + Default + PartialEq + Serialize,
    {
        if *target != T::default() {
            return;
        }
        if self.inheritance == Inheritance::DefaultsOnly && !self.is_metadata_default(name, option) {
            return;
        }
        *target = option.clone();
    }

    fn inherit_list<T>(&self, name: &str, target: &mut Vec<T>, option: &Vec<T>)
    where
        T: Clone + PartialEq + Serialize,
    {
        let written = self
            .raw
            .and_then(|raw| raw.get(name))
            .is_some_and(|value| !value.is_null());
        if written {
            return;
        }
        self.inherit(name, target, option);
    }

    fn is_metadata_default<T>(&self, name: &str, value: &T) -> bool
    where
        T: Default + PartialEq + Serialize,
    {
        match self.defaults.default_for(name) {
            Some(default) => serde_json::to_value(value).is_ok_and(|v| v == default),
            None => *value == T::default(),
        }
    }

    /// Every artifact field except `resourceName`, which has its own resolution
    fn merge(&self, artifact: &mut ArtifactConfiguration, options: &ArtifactConfiguration) {
        self.inherit("appName", &mut artifact.app_name, &options.app_name);
        self.inherit_list("apps", &mut artifact.apps, &options.apps);
        self.inherit("archivePattern", &mut artifact.archive_pattern, &options.archive_pattern);
        self.inherit_list(
            "artifactFilesToUpload",
            &mut artifact.artifact_files_to_upload,
            &options.artifact_files_to_upload,
        );
        self.inherit("artifactPattern", &mut artifact.artifact_pattern, &options.artifact_pattern);
        self.inherit("artifactType", &mut artifact.artifact_type, &options.artifact_type);
        self.inherit("extractFromMTA", &mut artifact.extract_from_mta, &options.extract_from_mta);
        self.inherit("hasArchive", &mut artifact.has_archive, &options.has_archive);
        self.inherit_list("helmValues", &mut artifact.helm_values, &options.helm_values);
        self.inherit(
            "overwriteHelmDockerImage",
            &mut artifact.overwrite_helm_docker_image,
            &options.overwrite_helm_docker_image,
        );
        self.inherit(
            "promotedDockerImage",
            &mut artifact.promoted_docker_image,
            &options.promoted_docker_image,
        );
        self.inherit("repository", &mut artifact.repository, &options.repository);
        self.inherit("uiUploadBasePath", &mut artifact.ui_upload_base_path, &options.ui_upload_base_path);
        self.inherit_list("uploadMetadata", &mut artifact.upload_metadata, &options.upload_metadata);
        self.inherit("uploadType", &mut artifact.upload_type, &options.upload_type);
    }
}

/// Resolves step options into the global configuration and the artifact list
pub struct ConfigurationResolver<'a> {
    defaults: &'a dyn DefaultLookup,
    resource_names: &'a dyn ResourceNameResolver,
}

impl<'a> ConfigurationResolver<'a> {
    pub fn new(defaults: &'a dyn DefaultLookup, resource_names: &'a dyn ResourceNameResolver) -> Self {
        Self {
            defaults,
            resource_names,
        }
    }

    pub fn resolve(
        &self,
        options: &StepOptions,
    ) -> Result<(GlobalConfiguration, Vec<ArtifactConfiguration>), ReleaseError> {
        let global = options.global.clone();

        let mut artifacts = if options.artifacts.is_empty() {
            vec![self.implicit_artifact(options)?]
        } else {
            self.explicit_artifacts(options)?
        };

        self.append_helm_chart_directory(&global, &mut artifacts);
        Ok((global, artifacts))
    }

    fn explicit_artifacts(&self, options: &StepOptions) -> Result<Vec<ArtifactConfiguration>, ReleaseError> {
        let mut artifacts = Vec::with_capacity(options.artifacts.len());
        for (index, raw) in options.artifacts.iter().enumerate() {
            let mut artifact: ArtifactConfiguration = serde_json::from_value(Value::Object(raw.clone()))
                .map_err(|source| ConfigError::ArtifactDecode { index, source })?;
            FieldMerger {
                defaults: self.defaults,
                inheritance: Inheritance::DefaultsOnly,
                raw: Some(raw),
            }
            .merge(&mut artifact, &options.artifact);
            artifacts.push(artifact);
        }

        if let [artifact] = artifacts.as_mut_slice() {
            if artifact.resource_name.is_empty() {
                artifact.resource_name = self.default_resource_name()?;
            }
        } else {
            mark_selective_mta_deployment(&mut artifacts)?;
        }
        Ok(artifacts)
    }

    fn implicit_artifact(&self, options: &StepOptions) -> Result<ArtifactConfiguration, ReleaseError> {
        let resource_name = if options.artifact.resource_name.is_empty() {
            self.default_resource_name()?
        } else {
            options.artifact.resource_name.clone()
        };

        let mut artifact = ArtifactConfiguration {
            resource_name,
            ..Default::default()
        };
        FieldMerger {
            defaults: self.defaults,
            inheritance: Inheritance::Unconditional,
            raw: None,
        }
        .merge(&mut artifact, &options.artifact);
        Ok(artifact)
    }

    fn default_resource_name(&self) -> Result<String, ExternalResolutionError> {
        let name = self.resource_names.resolve_default_resource_name()?;
        info!("No resourceName has been provided. Resolved default value to {}", name);
        Ok(name)
    }

    /// A customized chart directory is still bundled by Helm artifacts that
    /// kept the default upload file list.
    fn append_helm_chart_directory(&self, global: &GlobalConfiguration, artifacts: &mut [ArtifactConfiguration]) {
        let default_directory = self
            .defaults
            .default_for("helmChartDirectory")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        if global.helm_chart_directory == default_directory {
            return;
        }

        let default_files: Vec<String> = self
            .defaults
            .default_for("artifactFilesToUpload")
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        for artifact in artifacts.iter_mut() {
            if artifact.is_artifact_type(ArtifactType::Helm) && artifact.artifact_files_to_upload == default_files {
                debug!(
                    "Adding helm chart directory {} to files of {}",
                    global.helm_chart_directory, artifact.resource_name
                );
                artifact
                    .artifact_files_to_upload
                    .push(global.helm_chart_directory.clone());
            }
        }
    }
}

/// Tag the MTA artifact when a UI artifact is extracted from it
fn mark_selective_mta_deployment(artifacts: &mut [ArtifactConfiguration]) -> Result<(), ConfigError> {
    let ui_from_mta = artifacts.iter().any(|a| a.is_ui() && a.extract_from_mta);
    if !ui_from_mta {
        return Ok(());
    }

    let mta = artifacts
        .iter_mut()
        .rev()
        .find(|a| a.is_artifact_type(ArtifactType::Mta))
        .ok_or(ConfigError::MissingMtaArtifact)?;
    mta.upload_metadata
        .push(format!("{}=true", SELECTIVE_MTA_MODULE_DEPLOYMENT_KEY));
    Ok(())
}
