//! Centralized error types for stage-release
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use std::fmt;

use thiserror::Error;

/// Top-level error type for a release run
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Resolution error: {0}")]
    External(#[from] ExternalResolutionError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("resource '{resource}': {source}")]
    Artifact {
        resource: String,
        source: Box<ReleaseError>,
    },

    #[error("Unable to install release CLI: {0:#}")]
    Install(#[source] anyhow::Error),

    #[error("Unable to login to release CLI: {0:#}")]
    Login(#[source] anyhow::Error),

    #[error("Unable to upload artifact '{resource}': {source:#}")]
    Upload {
        resource: String,
        source: anyhow::Error,
    },
}

impl ReleaseError {
    /// Attach the resource name of the artifact being processed
    pub fn artifact(resource: impl Into<String>, source: impl Into<ReleaseError>) -> Self {
        Self::Artifact {
            resource: resource.into(),
            source: Box::new(source.into()),
        }
    }

    /// Classify the error for reporting. Nothing in this core is retried.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::Archive(_) => ErrorCategory::Configuration,
            Self::External(_) => ErrorCategory::ExternalResolution,
            Self::Artifact { source, .. } => source.category(),
            Self::Install(_) | Self::Login(_) | Self::Upload { .. } => ErrorCategory::Infrastructure,
        }
    }
}

/// Reporting category of a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    ExternalResolution,
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::ExternalResolution => "external-resolution",
            Self::Infrastructure => "infrastructure",
        };
        f.write_str(name)
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("mandatory parameter {name} not set")]
    MissingParameter { name: String },

    #[error("unable to resolve {field} from config")]
    MissingField { field: String },

    #[error("unable to resolve {field} from config. Make sure the CI/CD environment provides the login certificate")]
    MissingCertificate { field: String },

    #[error("environment variable {name} not set")]
    MissingEnvironmentVariable { name: String },

    #[error("failed to parse artifact #{index}: {source}")]
    ArtifactDecode {
        index: usize,
        source: serde_json::Error,
    },

    #[error("artifact upload type is not supported: '{value}'")]
    UnsupportedUploadType { value: String },

    #[error("artifact type is not supported: '{value}'")]
    UnsupportedArtifactType { value: String },

    #[error("artifact type '{artifact_type}' is not allowed for upload type '{upload_type}'")]
    ArtifactTypeNotAllowed {
        artifact_type: String,
        upload_type: String,
    },

    #[error("no resourceName provided for artifact type '{artifact_type}'")]
    MissingResourceName { artifact_type: String },

    #[error("duplicate resource name found: {name}")]
    DuplicateResourceName { name: String },

    #[error("invalid app name configuration for resource name {resource}: {reason}")]
    InvalidAppNames { resource: String, reason: String },

    #[error("no unique app name provided for resource '{resource}'")]
    NoUniqueAppName { resource: String },

    #[error("no artifact files to upload provided for resource name '{resource}'")]
    NoFilesToUpload { resource: String },

    #[error("no archive pattern provided for UI artifact with resource name '{resource}' but has archive")]
    MissingArchivePattern { resource: String },

    #[error("uiUploadBasePath parameter not set but is mandatory if appName is not set")]
    MissingUploadBasePath,

    #[error("specifying 'extractFromMTA' without defining a MTA service artifact is not supported")]
    MissingMtaArtifact,

    #[error("unknown stageWatchPolicy {name}")]
    UnknownWatchPolicy { name: String },

    #[error("stageWatchPolicy {policy} was specified but requiredSuccessfulStages is empty")]
    EmptyRequiredStages { policy: String },

    #[error("failed to parse metadata value {entry}, must be in the form of key=value")]
    MalformedUploadMetadata { entry: String },

    #[error("length of artifactURLs is 0")]
    NoArtifactUrls,

    #[error("expected 1 artifact URL for type {artifact_type} using pattern {pattern}, got {count}, which are: {matches:?}")]
    PatternMatchCount {
        artifact_type: String,
        pattern: String,
        count: usize,
        matches: Vec<String>,
    },

    #[error("failed to compile {field} regex '{pattern}': {source}")]
    InvalidRegex {
        field: &'static str,
        pattern: String,
        source: regex::Error,
    },

    #[error("invalid artifact glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("property {property} of {descriptor} not set")]
    LoginProperty {
        property: &'static str,
        descriptor: &'static str,
    },
}

/// Failures of the name and image resolution capabilities
#[derive(Error, Debug)]
pub enum ExternalResolutionError {
    #[error("unable to resolve default resourceName: {reason}")]
    ResourceName { reason: String },

    #[error("invalid repository url {url}: {reason}")]
    InvalidRepositoryUrl { url: String, reason: String },

    #[error("unable to resolve container image URL. Parameter promotedDockerImage is empty")]
    EmptyPromotedImage,

    #[error("unable to resolve container image URL. Parameter artifactVersion is empty, but needed when no image tag is provided with promotedDockerImage")]
    MissingArtifactVersion,

    #[error("unable to parse promotedDockerImage: {image}")]
    UnparsableImage { image: String },
}

/// Archive extraction errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive {path} does not exist")]
    NotFound { path: String },

    #[error("unsupported archive type '{extension}' of {path}")]
    UnsupportedType { extension: String, path: String },

    #[error("could not (uniquely) identify archive. Found {count} archives matching pattern {pattern}: {matches:?}")]
    AmbiguousMatch {
        pattern: String,
        count: usize,
        matches: Vec<String>,
    },

    #[error("invalid archive pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("archive entry {path} escapes the destination directory")]
    PathTraversal { path: String },

    #[error("error extracting archive {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("error extracting zip archive {path}: {source}")]
    Zip {
        path: String,
        source: zip::result::ZipError,
    },
}
