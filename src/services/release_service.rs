//! Release service - orchestrates the stage release workflow
//!
//! This service coordinates all steps of a release:
//! resolve and validate the configuration, select the login strategy,
//! install and log in to the release CLI, then prepare, describe and upload
//! every artifact in input order. The first failure stops the run.

use std::path::PathBuf;
use std::time::Instant;

use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info, info_span};
use uuid::Uuid;

use super::extraction::{extract_helm_chart, extract_ui_resources, retrieve_ui_apps_from_mta, MTA_UI_TARGET_DIR};
use crate::config::{ArtifactConfiguration, ArtifactType, DefaultLookup, GlobalConfiguration, StepOptions};
use crate::domain::validation::validate;
use crate::domain::{
    select_login, ArtifactDescriptor, ConfigurationResolver, ContainerImageResolver, DescriptorFactory,
    EnvironmentLookup, LoginDescriptor, OrchestratorDetector, ResourceNameResolver,
};
use crate::error::{ConfigError, ReleaseError};
use crate::infrastructure::FileSystem;

/// Release CLI binary used for login and upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CliTarget {
    pub binary: PathBuf,
}

impl CliTarget {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    pub id: String,
}

/// Installation of and login to the release CLI
pub trait CliSession {
    fn install(&mut self, github_token: &str) -> anyhow::Result<CliTarget>;
    fn login(&mut self, cli: &CliTarget, login: &LoginDescriptor) -> anyhow::Result<()>;
}

/// Uploads one descriptor and reports the created artifact id
pub trait UploadController {
    fn upload(&mut self, cli: &CliTarget, descriptor: &ArtifactDescriptor) -> anyhow::Result<UploadResponse>;
}

/// Capabilities the release core consumes
pub struct Collaborators<'a> {
    pub defaults: &'a dyn DefaultLookup,
    pub resource_names: &'a dyn ResourceNameResolver,
    pub images: &'a dyn ContainerImageResolver,
    pub environment: &'a dyn EnvironmentLookup,
    pub orchestrator: &'a dyn OrchestratorDetector,
    pub files: &'a dyn FileSystem,
}

/// Identifiers of the uploaded artifacts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseOutput {
    pub uploaded_artifact_ids: Vec<String>,
    /// Set only when exactly one artifact was uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_artifact_id: Option<String>,
}

impl ReleaseOutput {
    fn from_ids(ids: Vec<String>) -> Self {
        let uploaded_artifact_id = match ids.as_slice() {
            [id] => Some(id.clone()),
            _ => None,
        };
        Self {
            uploaded_artifact_ids: ids,
            uploaded_artifact_id,
        }
    }
}

/// Resolved configuration checked without touching the CLI or archives
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseCheck {
    pub login: LoginDescriptor,
    pub artifacts: Vec<ArtifactDescriptor>,
}

/// Service for orchestrating stage releases
pub struct ReleaseService<'a, B> {
    collaborators: Collaborators<'a>,
    backend: B,
}

impl<'a, B: CliSession + UploadController> ReleaseService<'a, B> {
    pub fn new(collaborators: Collaborators<'a>, backend: B) -> Self {
        Self { collaborators, backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Resolve and validate the step options
    pub fn resolve(
        &self,
        options: &StepOptions,
    ) -> Result<(GlobalConfiguration, Vec<ArtifactConfiguration>), ReleaseError> {
        let c = &self.collaborators;
        let (global, artifacts) = ConfigurationResolver::new(c.defaults, c.resource_names).resolve(options)?;
        validate(&global, &artifacts, c.defaults)?;
        debug!("Resolved {} artifact configuration(s)", artifacts.len());
        Ok((global, artifacts))
    }

    /// Resolve, validate, select the login and build every descriptor
    ///
    /// Archives are not extracted, so UI artifacts taken from an MTA are
    /// described from their configuration alone.
    pub fn check(&self, options: &StepOptions) -> Result<ReleaseCheck, ReleaseError> {
        let c = &self.collaborators;
        let (global, artifacts) = self.resolve(options)?;
        let login = select_login(&global, c.environment, c.orchestrator)?;
        login.login_args()?;

        let factory = DescriptorFactory::new(c.images);
        let artifacts = artifacts
            .iter()
            .map(|artifact| factory.build(&global, artifact))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReleaseCheck { login, artifacts })
    }

    /// Execute a full release run
    pub fn execute(&mut self, options: &StepOptions) -> Result<ReleaseOutput, ReleaseError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("release", run_id = %run_id);
        let _guard = span.enter();

        let (global, artifacts) = self.resolve(options)?;
        let login = select_login(&global, self.collaborators.environment, self.collaborators.orchestrator)?;

        let cli = if global.cli_path.is_empty() {
            self.backend
                .install(&global.github_token)
                .map_err(ReleaseError::Install)?
        } else {
            debug!("using release CLI binary at {}", global.cli_path);
            CliTarget::new(&global.cli_path)
        };
        self.backend.login(&cli, &login).map_err(login_error)?;

        let factory = DescriptorFactory::new(self.collaborators.images);
        let mut ids = Vec::with_capacity(artifacts.len());

        for mut artifact in artifacts {
            let start = Instant::now();
            let resource = artifact.resource_name.clone();

            self.prepare_archives(&global, &mut artifact)
                .map_err(|e| ReleaseError::artifact(&resource, e))?;

            let descriptor = factory.build(&global, &artifact)?;
            debug!("successfully created artifact descriptor for resource {}", resource);

            let response = self
                .backend
                .upload(&cli, &descriptor)
                .map_err(|source| ReleaseError::Upload {
                    resource: resource.clone(),
                    source,
                })?;

            info!(
                "{} {} uploaded as {} in {:.1}s",
                "✅".green(),
                resource,
                response.id,
                start.elapsed().as_secs_f64()
            );
            ids.push(response.id);
        }

        info!("Upload was successful");
        Ok(ReleaseOutput::from_ids(ids))
    }

    /// Extract the archives an artifact depends on
    fn prepare_archives(
        &self,
        global: &GlobalConfiguration,
        artifact: &mut ArtifactConfiguration,
    ) -> Result<(), ReleaseError> {
        let files = self.collaborators.files;
        let mut ui_target = PathBuf::new();

        if artifact.extract_from_mta && artifact.is_ui() {
            retrieve_ui_apps_from_mta(files, global, artifact)?;
            ui_target = PathBuf::from(MTA_UI_TARGET_DIR);
        }

        if artifact.has_archive {
            if artifact.is_artifact_type(ArtifactType::Helm) {
                extract_helm_chart(files, global)?;
            } else if artifact.is_ui() {
                extract_ui_resources(files, global, &artifact.archive_pattern, &ui_target)?;
            }
        }
        Ok(())
    }
}

/// Incomplete login descriptors stay configuration errors
fn login_error(e: anyhow::Error) -> ReleaseError {
    match e.downcast::<ConfigError>() {
        Ok(config) => ReleaseError::Config(config),
        Err(e) => ReleaseError::Login(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_step_options, StepMetadata};
    use crate::domain::descriptor::testing::FixedImage;
    use crate::domain::environment::testing::FakeEnvironment;
    use crate::domain::resolver::testing::FixedResourceName;
    use crate::domain::Orchestrator;
    use crate::error::ErrorCategory;
    use crate::services::extraction::testing::RecordingFileSystem;

    #[derive(Default)]
    struct FakeBackend {
        installs: usize,
        logins: Vec<CliTarget>,
        uploads: Vec<String>,
        fail_install: bool,
        fail_login: Option<fn() -> anyhow::Error>,
        fail_upload_of: Option<&'static str>,
    }

    impl CliSession for FakeBackend {
        fn install(&mut self, _github_token: &str) -> anyhow::Result<CliTarget> {
            self.installs += 1;
            if self.fail_install {
                anyhow::bail!("download failed");
            }
            Ok(CliTarget::new("/opt/dwc"))
        }

        fn login(&mut self, cli: &CliTarget, _login: &LoginDescriptor) -> anyhow::Result<()> {
            if let Some(failure) = self.fail_login {
                return Err(failure());
            }
            self.logins.push(cli.clone());
            Ok(())
        }
    }

    impl UploadController for FakeBackend {
        fn upload(&mut self, _cli: &CliTarget, descriptor: &ArtifactDescriptor) -> anyhow::Result<UploadResponse> {
            let resource = descriptor.resource_name().to_string();
            if self.fail_upload_of == Some(resource.as_str()) {
                anyhow::bail!("upload rejected");
            }
            self.uploads.push(resource.clone());
            Ok(UploadResponse {
                id: format!("id-{}", resource),
            })
        }
    }

    struct Fixture {
        metadata: StepMetadata,
        names: FixedResourceName,
        images: FixedImage,
        env: FakeEnvironment,
        files: RecordingFileSystem,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                metadata: StepMetadata::builtin().unwrap(),
                names: FixedResourceName(Some("github.example/team/shop/main")),
                images: FixedImage(Some(("registry.example/shop", "1.0"))),
                env: FakeEnvironment::default().on(Orchestrator::Jenkins),
                files: RecordingFileSystem::default(),
            }
        }

        fn service(&self, backend: FakeBackend) -> ReleaseService<'_, FakeBackend> {
            ReleaseService::new(
                Collaborators {
                    defaults: &self.metadata,
                    resource_names: &self.names,
                    images: &self.images,
                    environment: &self.env,
                    orchestrator: &self.env,
                    files: &self.files,
                },
                backend,
            )
        }

        fn options(&self, yaml: &str) -> StepOptions {
            let base = "projectName: shop\ngatewayCertificatePath: /certs/client.pem\n";
            parse_step_options(&format!("{}{}", base, yaml), &self.metadata).unwrap()
        }
    }

    const TWO_ARTIFACTS: &str = r#"
artifactURLs: ["repo/shop-1.0.jar"]
promotedDockerImage: registry.example/shop
artifacts:
  - resourceName: backend
    appName: backend
    artifactType: maven
    repository: repo
  - resourceName: image
    appName: image
    artifactType: docker
    promotedDockerImage: registry.example/shop
"#;

    #[test]
    fn test_single_implicit_artifact_release() {
        let fixture = Fixture::new();
        let options = fixture.options("appName: shop\nartifactType: docker\npromotedDockerImage: registry.example/shop\n");
        let mut service = fixture.service(FakeBackend::default());

        let output = service.execute(&options).unwrap();

        assert_eq!(output.uploaded_artifact_ids, vec!["id-github.example/team/shop/main"]);
        assert_eq!(output.uploaded_artifact_id.as_deref(), Some("id-github.example/team/shop/main"));
        let backend = service.into_backend();
        assert_eq!(backend.installs, 1);
        assert_eq!(backend.logins, vec![CliTarget::new("/opt/dwc")]);
    }

    #[test]
    fn test_artifacts_uploaded_in_order() {
        let fixture = Fixture::new();
        let mut service = fixture.service(FakeBackend::default());

        let output = service.execute(&fixture.options(TWO_ARTIFACTS)).unwrap();

        assert_eq!(output.uploaded_artifact_ids, vec!["id-backend", "id-image"]);
        assert_eq!(output.uploaded_artifact_id, None);
        assert_eq!(service.backend().uploads, vec!["backend", "image"]);
    }

    #[test]
    fn test_configured_cli_path_skips_install() {
        let fixture = Fixture::new();
        let mut service = fixture.service(FakeBackend::default());
        let options = fixture.options(&format!("cliPath: /usr/local/bin/dwc\n{}", TWO_ARTIFACTS));

        service.execute(&options).unwrap();

        let backend = service.into_backend();
        assert_eq!(backend.installs, 0);
        assert_eq!(backend.logins, vec![CliTarget::new("/usr/local/bin/dwc")]);
    }

    #[test]
    fn test_install_failure_is_infrastructure_error() {
        let fixture = Fixture::new();
        let mut service = fixture.service(FakeBackend {
            fail_install: true,
            ..Default::default()
        });

        let err = service.execute(&fixture.options(TWO_ARTIFACTS)).unwrap_err();
        assert!(matches!(err, ReleaseError::Install(_)));
        assert_eq!(err.category(), ErrorCategory::Infrastructure);
        assert!(service.backend().logins.is_empty());
    }

    #[test]
    fn test_login_failures_are_classified() {
        let fixture = Fixture::new();
        let mut service = fixture.service(FakeBackend {
            fail_login: Some(|| {
                anyhow::Error::from(ConfigError::LoginProperty {
                    property: "Project",
                    descriptor: "GatewayLoginDescriptor",
                })
            }),
            ..Default::default()
        });
        let err = service.execute(&fixture.options(TWO_ARTIFACTS)).unwrap_err();
        assert!(matches!(err, ReleaseError::Config(ConfigError::LoginProperty { .. })));
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let mut service = fixture.service(FakeBackend {
            fail_login: Some(|| anyhow::anyhow!("connection refused")),
            ..Default::default()
        });
        let err = service.execute(&fixture.options(TWO_ARTIFACTS)).unwrap_err();
        assert!(matches!(err, ReleaseError::Login(_)));
        assert_eq!(err.category(), ErrorCategory::Infrastructure);
    }

    #[test]
    fn test_invalid_configuration_stops_before_login() {
        let fixture = Fixture::new();
        let mut service = fixture.service(FakeBackend::default());
        let options = fixture.options("artifacts:\n  - resourceName: a\n    uploadType: ui\n    artifactType: maven\n");

        let err = service.execute(&options).unwrap_err();
        assert!(matches!(err, ReleaseError::Config(ConfigError::ArtifactTypeNotAllowed { .. })));
        assert_eq!(service.backend().installs, 0);
    }

    #[test]
    fn test_upload_failure_stops_the_run() {
        let fixture = Fixture::new();
        let mut service = fixture.service(FakeBackend {
            fail_upload_of: Some("backend"),
            ..Default::default()
        });

        let err = service.execute(&fixture.options(TWO_ARTIFACTS)).unwrap_err();
        assert!(err.to_string().contains("backend"));
        assert!(service.backend().uploads.is_empty());
    }

    #[test]
    fn test_ui_from_mta_extracts_before_upload() {
        let fixture = Fixture::new();
        let options = fixture.options(
            r#"
artifactURLs: ["repo/shop.mtar"]
mtarFilePath: shop.mtar
mtarUIPath: webapp
artifacts:
  - resourceName: mta
    appName: shop
    artifactType: mta
    repository: repo
  - resourceName: ui
    uploadType: ui
    appName: shop-ui
    extractFromMTA: true
"#,
        );
        let mut service = fixture.service(FakeBackend::default());

        service.execute(&options).unwrap();

        assert_eq!(
            *fixture.files.calls.borrow(),
            vec![
                "unzip downloads/shop.mtar extracted_mtar",
                "unzip extracted_mtar/dwc-ui-appcontent/webapp/data.zip downloads",
                "glob downloads/shop-ui.zip",
                "unzip downloads/shop-ui.zip dist",
            ]
        );
        assert_eq!(service.backend().uploads, vec!["mta", "ui"]);
    }

    #[test]
    fn test_check_builds_descriptors_without_side_effects() {
        let fixture = Fixture::new();
        let service = fixture.service(FakeBackend::default());

        let check = service.check(&fixture.options(TWO_ARTIFACTS)).unwrap();

        assert!(matches!(check.login, LoginDescriptor::Gateway(_)));
        assert_eq!(check.artifacts.len(), 2);
        assert_eq!(check.artifacts[0].kind(), "java");
        assert!(fixture.files.calls.borrow().is_empty());
        assert_eq!(service.backend().installs, 0);
    }
}
