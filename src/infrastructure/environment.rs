//! Process environment adapters
//!
//! Reads CI variables from the process environment and derives the default
//! resource name from the repository the pipeline runs for.

use std::env;

use tracing::debug;

use crate::domain::environment::{detect_orchestrator, EnvironmentLookup, Orchestrator, OrchestratorDetector};
use crate::domain::image::default_resource_name;
use crate::domain::ResourceNameResolver;
use crate::error::ExternalResolutionError;

/// Environment of the running process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl EnvironmentLookup for ProcessEnvironment {
    fn lookup_env(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

impl OrchestratorDetector for ProcessEnvironment {
    fn detect(&self) -> Orchestrator {
        let orchestrator = detect_orchestrator(self);
        debug!("Detected orchestrator {:?}", orchestrator);
        orchestrator
    }
}

/// Resolves `<instance>/<org>/<repo>/<branch>` from CI variables
pub struct EnvironmentResourceNames<'a> {
    env: &'a dyn EnvironmentLookup,
}

impl<'a> EnvironmentResourceNames<'a> {
    pub fn new(env: &'a dyn EnvironmentLookup) -> Self {
        Self { env }
    }

    fn non_empty(&self, name: &str) -> Option<String> {
        self.env.lookup_env(name).filter(|v| !v.is_empty())
    }

    fn repository_url(&self) -> Option<String> {
        match (self.non_empty("GITHUB_SERVER_URL"), self.non_empty("GITHUB_REPOSITORY")) {
            (Some(server), Some(repository)) => {
                Some(format!("{}/{}", server.trim_end_matches('/'), repository))
            }
            _ => self.non_empty("GIT_URL"),
        }
    }

    fn branch(&self) -> Option<String> {
        self.non_empty("GITHUB_REF_NAME")
            .or_else(|| self.non_empty("GIT_BRANCH"))
            .map(|b| b.trim_start_matches("origin/").to_string())
    }
}

impl ResourceNameResolver for EnvironmentResourceNames<'_> {
    fn resolve_default_resource_name(&self) -> Result<String, ExternalResolutionError> {
        let url = self.repository_url().ok_or_else(|| ExternalResolutionError::ResourceName {
            reason: "repository URL unknown, set GITHUB_SERVER_URL and GITHUB_REPOSITORY or GIT_URL".to_string(),
        })?;
        let branch = self.branch().ok_or_else(|| ExternalResolutionError::ResourceName {
            reason: "branch unknown, set GITHUB_REF_NAME or GIT_BRANCH".to_string(),
        })?;
        default_resource_name(&url, &branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::environment::testing::FakeEnvironment;

    #[test]
    fn test_resource_name_from_github_variables() {
        let env = FakeEnvironment::default()
            .with("GITHUB_SERVER_URL", "https://github.example/")
            .with("GITHUB_REPOSITORY", "team/shop")
            .with("GITHUB_REF_NAME", "main");
        let name = EnvironmentResourceNames::new(&env)
            .resolve_default_resource_name()
            .unwrap();
        assert_eq!(name, "github.example/team/shop/main");
    }

    #[test]
    fn test_resource_name_from_jenkins_variables() {
        let env = FakeEnvironment::default()
            .with("GIT_URL", "https://github.example/team/shop.git")
            .with("GIT_BRANCH", "origin/release");
        let name = EnvironmentResourceNames::new(&env)
            .resolve_default_resource_name()
            .unwrap();
        assert_eq!(name, "github.example/team/shop/release");
    }

    #[test]
    fn test_resource_name_needs_repository_and_branch() {
        let env = FakeEnvironment::default().with("GITHUB_REF_NAME", "main");
        assert!(EnvironmentResourceNames::new(&env)
            .resolve_default_resource_name()
            .is_err());

        let env = FakeEnvironment::default().with("GIT_URL", "https://github.example/team/shop");
        assert!(EnvironmentResourceNames::new(&env)
            .resolve_default_resource_name()
            .is_err());
    }
}
