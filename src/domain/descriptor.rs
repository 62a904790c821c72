//! # Artifact Descriptors
//!
//! Typed upload descriptors built from a validated [`ArtifactConfiguration`].
//!
//! ## Dispatch
//!
//! | upload type | artifact type                          | descriptor |
//! |-------------|----------------------------------------|------------|
//! | service     | java, maven                            | `Java`     |
//! | service     | mta, maven-mta                         | `Mta`      |
//! | service     | docker, dockerbuild-releaseMetadata    | `Docker`   |
//! | service     | helm                                   | `Helm`     |
//! | ui          | (none)                                 | `Ui`       |
//! | orbit       | (none), docker, dockerbuild-releaseMetadata | `Orbit` |
//!
//! Every descriptor shares a [`DescriptorBase`] with the resource name,
//! apps, file patterns, stage watch policy and upload metadata.

use std::collections::BTreeMap;

use glob::{MatchOptions, Pattern};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use super::download_urls::derive_additional_download_urls;
use super::image::ContainerImageResolver;
use super::watch_policy::StageWatchPolicy;
use crate::config::{App, ArtifactConfiguration, ArtifactType, GlobalConfiguration, UploadType};
use crate::error::{ConfigError, ReleaseError};

/// Fields shared by every descriptor variant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorBase {
    pub resource_name: String,
    pub app_name: String,
    pub apps: Vec<App>,
    pub file_patterns: Vec<String>,
    pub stages_to_watch: Vec<String>,
    pub watch_resource_of_interest: bool,
    pub stage_watch_policy: StageWatchPolicy,
    pub upload_metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaArtifact {
    #[serde(flatten)]
    pub base: DescriptorBase,
    pub artifact_url: String,
    pub additional_download_urls: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MtaArtifact {
    #[serde(flatten)]
    pub base: DescriptorBase,
    pub artifact_url: String,
    pub additional_download_urls: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerArtifact {
    #[serde(flatten)]
    pub base: DescriptorBase,
    pub container_image_locator: String,
    pub additional_download_urls: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmArtifact {
    #[serde(flatten)]
    pub base: DescriptorBase,
    /// Overwrite `image.repository`/`image.tag` in the chart values
    pub patch_image_spec: bool,
    pub value_files: Vec<String>,
    pub container_image: String,
    pub image_tag: String,
    pub helm_chart_directory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiArtifact {
    #[serde(flatten)]
    pub base: DescriptorBase,
    pub upload_base_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitArtifact {
    #[serde(flatten)]
    pub base: DescriptorBase,
    pub container_image_locator: String,
    pub helm_chart_directory: String,
    pub additional_download_urls: BTreeMap<String, String>,
}

/// Resolved upload unit handed to the upload controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ArtifactDescriptor {
    Java(JavaArtifact),
    Mta(MtaArtifact),
    Docker(DockerArtifact),
    Helm(HelmArtifact),
    Ui(UiArtifact),
    Orbit(OrbitArtifact),
}

impl ArtifactDescriptor {
    pub fn base(&self) -> &DescriptorBase {
        match self {
            Self::Java(a) => &a.base,
            Self::Mta(a) => &a.base,
            Self::Docker(a) => &a.base,
            Self::Helm(a) => &a.base,
            Self::Ui(a) => &a.base,
            Self::Orbit(a) => &a.base,
        }
    }

    pub fn resource_name(&self) -> &str {
        &self.base().resource_name
    }

    /// MTAs are uploaded as built; every other kind bundles its file patterns
    pub fn needs_file_bundling(&self) -> bool {
        !matches!(self, Self::Mta(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Java(_) => "java",
            Self::Mta(_) => "mta",
            Self::Docker(_) => "docker",
            Self::Helm(_) => "helm",
            Self::Ui(_) => "ui",
            Self::Orbit(_) => "orbit",
        }
    }
}

/// Builds descriptors, resolving container images through the injected resolver
pub struct DescriptorFactory<'a> {
    images: &'a dyn ContainerImageResolver,
}

impl<'a> DescriptorFactory<'a> {
    pub fn new(images: &'a dyn ContainerImageResolver) -> Self {
        Self { images }
    }

    /// Build the descriptor of one artifact; errors name the resource
    pub fn build(
        &self,
        global: &GlobalConfiguration,
        artifact: &ArtifactConfiguration,
    ) -> Result<ArtifactDescriptor, ReleaseError> {
        self.build_descriptor(global, artifact)
            .map_err(|e| ReleaseError::artifact(&artifact.resource_name, e))
    }

    fn build_descriptor(
        &self,
        global: &GlobalConfiguration,
        artifact: &ArtifactConfiguration,
    ) -> Result<ArtifactDescriptor, ReleaseError> {
        let base = descriptor_base(global, artifact)?;

        let descriptor = match artifact.upload_type()? {
            UploadType::Service => {
                let artifact_type =
                    artifact
                        .artifact_type()?
                        .ok_or_else(|| ConfigError::UnsupportedArtifactType {
                            value: String::new(),
                        })?;
                self.build_service(global, artifact, artifact_type, base)?
            }
            UploadType::Ui => ArtifactDescriptor::Ui(ui_artifact(base, &artifact.ui_upload_base_path)?),
            UploadType::Orbit => {
                let locator = self.image_locator(global, artifact)?;
                let additional_download_urls =
                    derive_additional_download_urls(&global.derive_additional_download_urls, &locator)?;
                ArtifactDescriptor::Orbit(OrbitArtifact {
                    base,
                    container_image_locator: locator,
                    helm_chart_directory: global.helm_chart_directory.clone(),
                    additional_download_urls,
                })
            }
        };

        debug!(
            "Built {} descriptor for resource {}",
            descriptor.kind(),
            descriptor.resource_name()
        );
        Ok(descriptor)
    }

    fn build_service(
        &self,
        global: &GlobalConfiguration,
        artifact: &ArtifactConfiguration,
        artifact_type: ArtifactType,
        base: DescriptorBase,
    ) -> Result<ArtifactDescriptor, ReleaseError> {
        let descriptor = match artifact_type {
            ArtifactType::Java | ArtifactType::Maven | ArtifactType::Mta | ArtifactType::MavenMta => {
                let artifact_url = select_artifact_url(
                    &global.artifact_urls,
                    artifact_type,
                    &artifact.artifact_pattern,
                    &artifact.repository,
                )?;
                let additional_download_urls =
                    derive_additional_download_urls(&global.derive_additional_download_urls, &artifact_url)?;

                if matches!(artifact_type, ArtifactType::Mta | ArtifactType::MavenMta) {
                    ArtifactDescriptor::Mta(MtaArtifact {
                        base,
                        artifact_url,
                        additional_download_urls,
                    })
                } else {
                    ArtifactDescriptor::Java(JavaArtifact {
                        base,
                        artifact_url,
                        additional_download_urls,
                    })
                }
            }
            ArtifactType::Docker | ArtifactType::DockerBuildReleaseMetadata => {
                let locator = self.image_locator(global, artifact)?;
                let additional_download_urls =
                    derive_additional_download_urls(&global.derive_additional_download_urls, &locator)?;
                ArtifactDescriptor::Docker(DockerArtifact {
                    base,
                    container_image_locator: locator,
                    additional_download_urls,
                })
            }
            ArtifactType::Helm => {
                let (container_image, image_tag) = self
                    .images
                    .resolve_container_image_url(&artifact.promoted_docker_image, &global.artifact_version)?;
                ArtifactDescriptor::Helm(HelmArtifact {
                    base,
                    patch_image_spec: artifact.overwrite_helm_docker_image,
                    value_files: artifact.helm_values.clone(),
                    container_image,
                    image_tag,
                    helm_chart_directory: global.helm_chart_directory.clone(),
                })
            }
        };
        Ok(descriptor)
    }

    fn image_locator(
        &self,
        global: &GlobalConfiguration,
        artifact: &ArtifactConfiguration,
    ) -> Result<String, ReleaseError> {
        let (image, tag) = self
            .images
            .resolve_container_image_url(&artifact.promoted_docker_image, &global.artifact_version)?;
        Ok(format!("{}:{}", image, tag))
    }
}

fn descriptor_base(
    global: &GlobalConfiguration,
    artifact: &ArtifactConfiguration,
) -> Result<DescriptorBase, ConfigError> {
    let stage_watch_policy =
        StageWatchPolicy::select(&global.stage_watch_policy, &global.required_successful_stages)?;
    let mut upload_metadata = parse_upload_metadata(&artifact.upload_metadata)?;
    add_pipeline_metadata(&mut upload_metadata, global);

    Ok(DescriptorBase {
        resource_name: artifact.resource_name.clone(),
        app_name: artifact.app_name.clone(),
        apps: artifact.apps.clone(),
        file_patterns: artifact.artifact_files_to_upload.clone(),
        stages_to_watch: global.stages_to_watch.clone(),
        watch_resource_of_interest: global.watch_resource_of_interest,
        stage_watch_policy,
        upload_metadata,
    })
}

fn ui_artifact(base: DescriptorBase, upload_base_path: &str) -> Result<UiArtifact, ConfigError> {
    let upload_base_path = if upload_base_path.is_empty() {
        if base.app_name.is_empty() {
            return Err(ConfigError::MissingUploadBasePath);
        }
        let path = format!("webapps/{}/", base.app_name);
        info!("uiUploadBasePath parameter not set. Defaulting to {}", path);
        path
    } else {
        upload_base_path.to_string()
    };
    Ok(UiArtifact { base, upload_base_path })
}

/// Parse `key=value` entries, splitting on the first `=`
pub fn parse_upload_metadata(entries: &[String]) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut metadata = BTreeMap::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedUploadMetadata { entry: entry.clone() })?;
        debug!("parsed metadata: key={} value={}", key, value);
        metadata.insert(key.to_string(), value.to_string());
    }
    Ok(metadata)
}

/// Record pipeline and vault identifiers when configured
pub fn add_pipeline_metadata(metadata: &mut BTreeMap<String, String>, global: &GlobalConfiguration) {
    let identifiers = [
        ("pipelineId", &global.pipeline_id),
        ("vaultBasePath", &global.vault_base_path),
        ("pipelineRunKey", &global.cumulus_pipeline_run_key),
    ];
    for (key, value) in identifiers {
        if !value.is_empty() {
            metadata.insert(key.to_string(), value.clone());
        }
    }
}

/// Pick the single artifact URL matching the user regex or the type's default glob
pub fn select_artifact_url(
    urls: &[String],
    artifact_type: ArtifactType,
    artifact_pattern: &str,
    repository: &str,
) -> Result<String, ConfigError> {
    if urls.is_empty() {
        return Err(ConfigError::NoArtifactUrls);
    }
    if repository.is_empty() && artifact_pattern.is_empty() {
        return Err(ConfigError::MissingField {
            field: "repository".to_string(),
        });
    }

    let (pattern, matches) = if artifact_pattern.is_empty() {
        let pattern = artifact_type.default_url_pattern(repository);
        debug!("no artifact pattern provided, using default pattern {}", pattern);
        let glob = Pattern::new(&pattern).map_err(|source| ConfigError::InvalidGlob {
            pattern: pattern.clone(),
            source,
        })?;
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        let matches = filter_urls(urls, |url| glob.matches_with(url, options));
        (pattern, matches)
    } else {
        debug!("artifact pattern (regex) '{}' provided by user", artifact_pattern);
        let regex = Regex::new(artifact_pattern).map_err(|source| ConfigError::InvalidRegex {
            field: "artifactPattern",
            pattern: artifact_pattern.to_string(),
            source,
        })?;
        let matches = filter_urls(urls, |url| regex.is_match(url));
        (artifact_pattern.to_string(), matches)
    };

    match <[String; 1]>::try_from(matches) {
        Ok([url]) => Ok(url),
        Err(matches) => Err(ConfigError::PatternMatchCount {
            artifact_type: artifact_type.to_string(),
            pattern,
            count: matches.len(),
            matches,
        }),
    }
}

fn filter_urls(urls: &[String], is_match: impl Fn(&str) -> bool) -> Vec<String> {
    urls.iter()
        .filter(|url| {
            let matched = is_match(url);
            debug!("artifact URL '{}' matches pattern: {}", url, matched);
            matched
        })
        .cloned()
        .collect()
}


#[cfg(test)]
mod tests {
    use super::testing::FixedImage;
    use super::*;
    use crate::config::DeriveAdditionalDownloadUrlsEntry;
    use crate::domain::image::PromotedImageResolver;
    use crate::error::ExternalResolutionError;

    fn global() -> GlobalConfiguration {
        GlobalConfiguration {
            artifact_urls: vec!["repo/a-1.0.jar".to_string(), "repo/a-1.0-sources.jar".to_string()],
            artifact_version: "1.0".to_string(),
            helm_chart_directory: "helm".to_string(),
            stage_watch_policy: "overallSuccess".to_string(),
            ..Default::default()
        }
    }

    fn artifact(upload_type: &str, artifact_type: &str) -> ArtifactConfiguration {
        ArtifactConfiguration {
            resource_name: "shop".to_string(),
            app_name: "shop-app".to_string(),
            upload_type: upload_type.to_string(),
            artifact_type: artifact_type.to_string(),
            artifact_files_to_upload: vec!["cf".to_string()],
            ..Default::default()
        }
    }

    fn build(global: &GlobalConfiguration, artifact: &ArtifactConfiguration) -> Result<ArtifactDescriptor, ReleaseError> {
        DescriptorFactory::new(&PromotedImageResolver).build(global, artifact)
    }

    #[test]
    fn test_maven_descriptor_uses_single_matching_url() {
        let mut maven = artifact("service", "maven");
        maven.artifact_pattern = r"a-1\.0\.jar$".to_string();

        let ArtifactDescriptor::Java(java) = build(&global(), &maven).unwrap() else {
            panic!("expected java descriptor");
        };
        assert_eq!(java.artifact_url, "repo/a-1.0.jar");
        assert_eq!(java.base.resource_name, "shop");
        assert_eq!(java.base.stage_watch_policy, StageWatchPolicy::OverallSuccess);
    }

    #[test]
    fn test_pattern_matching_two_urls_fails() {
        let mut maven = artifact("service", "maven");
        maven.artifact_pattern = r"\.jar$".to_string();

        let err = build(&global(), &maven).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("shop"));
        assert!(message.contains("got 2"));
        let ReleaseError::Artifact { source, .. } = err else {
            panic!("expected artifact error");
        };
        assert!(matches!(*source, ReleaseError::Config(ConfigError::PatternMatchCount { count: 2, .. })));
    }

    #[test]
    fn test_default_glob_from_repository() {
        let urls = vec![
            "https://repo.example/releases/com/acme/app/1.0/app-1.0.jar".to_string(),
            "https://repo.example/releases/com/acme/app/1.0/app-1.0.mtar".to_string(),
            "https://repo.example/snapshots/com/acme/app/1.0/app-1.0.jar".to_string(),
        ];
        assert_eq!(
            select_artifact_url(&urls, ArtifactType::Maven, "", "releases").unwrap(),
            urls[0]
        );
        assert_eq!(
            select_artifact_url(&urls, ArtifactType::Mta, "", "releases").unwrap(),
            urls[1]
        );
        assert!(matches!(
            select_artifact_url(&urls, ArtifactType::Maven, "", "staging"),
            Err(ConfigError::PatternMatchCount { count: 0, .. })
        ));
    }

    #[test]
    fn test_url_selection_preconditions() {
        assert!(matches!(
            select_artifact_url(&[], ArtifactType::Maven, "", "releases"),
            Err(ConfigError::NoArtifactUrls)
        ));
        let urls = vec!["repo/a.jar".to_string()];
        assert!(matches!(
            select_artifact_url(&urls, ArtifactType::Maven, "", ""),
            Err(ConfigError::MissingField { .. })
        ));
        assert!(matches!(
            select_artifact_url(&urls, ArtifactType::Maven, "(", ""),
            Err(ConfigError::InvalidRegex { field: "artifactPattern", .. })
        ));
    }

    #[test]
    fn test_mta_descriptor_skips_file_bundling() {
        let mut global = global();
        global.artifact_urls = vec!["repo/bundle.mtar".to_string()];
        let mut mta = artifact("service", "mta");
        mta.repository = "repo".to_string();

        let descriptor = build(&global, &mta).unwrap();
        assert_eq!(descriptor.kind(), "mta");
        assert!(!descriptor.needs_file_bundling());
    }

    #[test]
    fn test_docker_descriptor_derives_from_locator() {
        let mut global = global();
        global.derive_additional_download_urls = vec![DeriveAdditionalDownloadUrlsEntry {
            key: "sbom".to_string(),
            find_pattern: ":(.+)$".to_string(),
            replace_with: ":$1.sbom".to_string(),
        }];
        let mut docker = artifact("service", "docker");
        docker.promoted_docker_image = "registry.example/shop".to_string();

        let ArtifactDescriptor::Docker(descriptor) = build(&global, &docker).unwrap() else {
            panic!("expected docker descriptor");
        };
        assert_eq!(descriptor.container_image_locator, "registry.example/shop:1.0");
        assert_eq!(
            descriptor.additional_download_urls["sbom"],
            "registry.example/shop:1.0.sbom"
        );
    }

    #[test]
    fn test_helm_descriptor_carries_image_and_chart() {
        let mut helm = artifact("service", "helm");
        helm.overwrite_helm_docker_image = true;
        helm.helm_values = vec!["values-prod.yaml".to_string()];

        let descriptor = DescriptorFactory::new(&FixedImage(Some(("registry.example/shop", "2.0"))))
            .build(&global(), &helm)
            .unwrap();
        let ArtifactDescriptor::Helm(helm) = descriptor else {
            panic!("expected helm descriptor");
        };
        assert!(helm.patch_image_spec);
        assert_eq!(helm.value_files, vec!["values-prod.yaml"]);
        assert_eq!(helm.container_image, "registry.example/shop");
        assert_eq!(helm.image_tag, "2.0");
        assert_eq!(helm.helm_chart_directory, "helm");
    }

    #[test]
    fn test_image_failure_is_wrapped_with_resource() {
        let docker = artifact("service", "docker");
        let err = DescriptorFactory::new(&FixedImage(None))
            .build(&global(), &docker)
            .unwrap_err();
        let ReleaseError::Artifact { resource, source } = err else {
            panic!("expected artifact error");
        };
        assert_eq!(resource, "shop");
        assert!(matches!(
            *source,
            ReleaseError::External(ExternalResolutionError::EmptyPromotedImage)
        ));
    }

    #[test]
    fn test_ui_upload_base_path() {
        let ui = artifact("ui", "");
        let ArtifactDescriptor::Ui(descriptor) = build(&global(), &ui).unwrap() else {
            panic!("expected ui descriptor");
        };
        assert_eq!(descriptor.upload_base_path, "webapps/shop-app/");

        let mut ui = artifact("ui", "");
        ui.app_name.clear();
        let err = build(&global(), &ui).unwrap_err();
        assert!(err.to_string().contains("uiUploadBasePath"));

        ui.ui_upload_base_path = "static/".to_string();
        let ArtifactDescriptor::Ui(descriptor) = build(&global(), &ui).unwrap() else {
            panic!("expected ui descriptor");
        };
        assert_eq!(descriptor.upload_base_path, "static/");
    }

    #[test]
    fn test_orbit_descriptor() {
        let mut orbit = artifact("orbit", "");
        orbit.promoted_docker_image = "registry.example:5000/shop:3.1".to_string();

        let ArtifactDescriptor::Orbit(descriptor) = build(&global(), &orbit).unwrap() else {
            panic!("expected orbit descriptor");
        };
        assert_eq!(descriptor.container_image_locator, "registry.example:5000/shop:3.1");
        assert_eq!(descriptor.helm_chart_directory, "helm");
    }

    #[test]
    fn test_upload_metadata_enrichment() {
        let mut global = global();
        global.pipeline_id = "pipe-1".to_string();
        global.cumulus_pipeline_run_key = "run-7".to_string();
        let mut maven = artifact("service", "maven");
        maven.artifact_pattern = r"a-1\.0\.jar$".to_string();
        maven.upload_metadata = vec!["team=core".to_string(), "query=a=b".to_string()];

        let descriptor = build(&global, &maven).unwrap();
        let metadata = &descriptor.base().upload_metadata;
        assert_eq!(metadata["team"], "core");
        assert_eq!(metadata["query"], "a=b");
        assert_eq!(metadata["pipelineId"], "pipe-1");
        assert_eq!(metadata["pipelineRunKey"], "run-7");
        assert!(!metadata.contains_key("vaultBasePath"));
    }

    #[test]
    fn test_malformed_metadata_and_policy_fail() {
        let mut maven = artifact("service", "maven");
        maven.upload_metadata = vec!["novalue".to_string()];
        let err = build(&global(), &maven).unwrap_err();
        assert!(err.to_string().contains("novalue"));

        let mut global = global();
        global.stage_watch_policy = "subsetSuccess".to_string();
        let err = build(&global, &artifact("ui", "")).unwrap_err();
        assert!(err.to_string().contains("requiredSuccessfulStages is empty"));
    }
}
