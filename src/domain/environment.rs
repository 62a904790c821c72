//! Execution environment: CI orchestrator kind and environment variables.

use serde::Serialize;

/// Environment variable carrying the OIDC token request bearer token
pub const OIDC_REQUEST_TOKEN_ENV_VAR: &str = "PIPER_ACTIONS_ID_TOKEN_REQUEST_TOKEN";

/// Environment variable carrying the OIDC token request URL
pub const OIDC_REQUEST_URL_ENV_VAR: &str = "PIPER_ACTIONS_ID_TOKEN_REQUEST_URL";

/// CI system the release runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Orchestrator {
    GitHubActions,
    Jenkins,
    AzureDevOps,
    Unknown,
}

impl Orchestrator {
    /// Whether the orchestrator can issue federated OIDC identity tokens
    pub fn supports_oidc_federation(&self) -> bool {
        matches!(self, Self::GitHubActions)
    }
}

/// Read access to environment variables
pub trait EnvironmentLookup {
    fn lookup_env(&self, name: &str) -> Option<String>;
}

/// Detection of the CI orchestrator
pub trait OrchestratorDetector {
    fn detect(&self) -> Orchestrator;
}

/// Detect the orchestrator from its well-known environment variables
pub fn detect_orchestrator(env: &dyn EnvironmentLookup) -> Orchestrator {
    let is_set = |name: &str| env.lookup_env(name).is_some_and(|v| !v.is_empty());

    if env.lookup_env("GITHUB_ACTIONS").as_deref() == Some("true") {
        Orchestrator::GitHubActions
    } else if is_set("JENKINS_URL") || is_set("JENKINS_HOME") {
        Orchestrator::Jenkins
    } else if env
        .lookup_env("TF_BUILD")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        Orchestrator::AzureDevOps
    } else {
        Orchestrator::Unknown
    }
}
