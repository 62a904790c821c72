//! Container image references and repository-derived resource names.

use crate::error::ExternalResolutionError;

/// Splits a promoted image reference into image and tag
pub trait ContainerImageResolver {
    fn resolve_container_image_url(
        &self,
        promoted_image: &str,
        artifact_version: &str,
    ) -> Result<(String, String), ExternalResolutionError>;
}

/// Resolver for `registry[:port]/path[:tag]` references
///
/// An untagged image is tagged with the artifact version.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromotedImageResolver;

impl ContainerImageResolver for PromotedImageResolver {
    fn resolve_container_image_url(
        &self,
        promoted_image: &str,
        artifact_version: &str,
    ) -> Result<(String, String), ExternalResolutionError> {
        if promoted_image.is_empty() {
            return Err(ExternalResolutionError::EmptyPromotedImage);
        }

        let untagged = || {
            if artifact_version.is_empty() {
                return Err(ExternalResolutionError::MissingArtifactVersion);
            }
            Ok((promoted_image.to_string(), artifact_version.to_string()))
        };

        let parts: Vec<&str> = promoted_image.split(':').collect();
        match parts.as_slice() {
            [_] => untagged(),
            // a '/' after the colon means the colon belonged to a registry port
            [_, rest] if rest.contains('/') => untagged(),
            [image, tag] => Ok((image.to_string(), tag.to_string())),
            [registry, path, tag] if !tag.contains('/') => Ok((format!("{}:{}", registry, path), tag.to_string())),
            _ => Err(ExternalResolutionError::UnparsableImage {
                image: promoted_image.to_string(),
            }),
        }
    }
}

/// Split `https://<instance>/<org>/<repo>[/...]` into instance and `org/repo`
pub fn extract_github_instance_and_repository(url: &str) -> Result<(String, String), ExternalResolutionError> {
    let Some(trimmed) = url.strip_prefix("https://") else {
        return Err(ExternalResolutionError::InvalidRepositoryUrl {
            url: url.to_string(),
            reason: "expected prefix: https://".to_string(),
        });
    };

    let parts: Vec<&str> = trimmed.split('/').collect();
    let [instance, org, repository, ..] = parts.as_slice() else {
        return Err(ExternalResolutionError::InvalidRepositoryUrl {
            url: url.to_string(),
            reason: "expected <instance>/<org>/<repository>".to_string(),
        });
    };
    let repository = repository.strip_suffix(".git").unwrap_or(*repository);
    Ok((instance.to_string(), format!("{}/{}", org, repository)))
}

/// `<instance>/<org>/<repo>/<branch>`
pub fn default_resource_name(repository_url: &str, branch: &str) -> Result<String, ExternalResolutionError> {
    if branch.is_empty() {
        return Err(ExternalResolutionError::ResourceName {
            reason: "git branch is unknown".to_string(),
        });
    }
    let (instance, repository) = extract_github_instance_and_repository(repository_url)?;
    Ok(format!("{}/{}/{}", instance, repository, branch))
}
