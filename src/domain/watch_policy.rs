//! Stage watch policies
//!
//! A policy decides whether the deployment outcomes of the watched stages
//! make a release successful. The policy travels inside every artifact
//! descriptor; the release backend evaluates it once the stages report back.

use serde::Serialize;
use thiserror::Error;

use crate::error::ConfigError;

pub const OVERALL_SUCCESS: &str = "overallSuccess";
pub const SUBSET_SUCCESS: &str = "subsetSuccess";
pub const ALWAYS_PASS: &str = "alwaysPass";
pub const AT_LEAST_ONE_SUCCESSFUL_DEPLOYMENT: &str = "atLeastOneSuccessfulDeployment";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", content = "requiredStages", rename_all = "camelCase")]
pub enum StageWatchPolicy {
    /// Every watched stage must succeed
    OverallSuccess,
    /// Every listed stage that reported must succeed
    SubsetSuccess(Vec<String>),
    AlwaysPass,
    AtLeastOneSuccessfulDeployment,
}

/// Deployment outcome of one watched stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: String,
    pub succeeded: bool,
}

impl StageOutcome {
    pub fn new(stage: impl Into<String>, succeeded: bool) -> Self {
        Self {
            stage: stage.into(),
            succeeded,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("stage watch policy violated: {reason}")]
pub struct PolicyViolation {
    pub reason: String,
}

impl StageWatchPolicy {
    /// Select a policy by its configured name
    pub fn select(name: &str, required_stages: &[String]) -> Result<Self, ConfigError> {
        match name {
            OVERALL_SUCCESS => Ok(Self::OverallSuccess),
            SUBSET_SUCCESS => {
                if required_stages.is_empty() {
                    return Err(ConfigError::EmptyRequiredStages {
                        policy: SUBSET_SUCCESS.to_string(),
                    });
                }
                Ok(Self::SubsetSuccess(required_stages.to_vec()))
            }
            ALWAYS_PASS => Ok(Self::AlwaysPass),
            AT_LEAST_ONE_SUCCESSFUL_DEPLOYMENT => Ok(Self::AtLeastOneSuccessfulDeployment),
            _ => Err(ConfigError::UnknownWatchPolicy {
                name: name.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OverallSuccess => OVERALL_SUCCESS,
            Self::SubsetSuccess(_) => SUBSET_SUCCESS,
            Self::AlwaysPass => ALWAYS_PASS,
            Self::AtLeastOneSuccessfulDeployment => AT_LEAST_ONE_SUCCESSFUL_DEPLOYMENT,
        }
    }

    pub fn evaluate(&self, outcomes: &[StageOutcome]) -> Result<(), PolicyViolation> {
        match self {
            Self::OverallSuccess => {
                let failures = failed_stages(outcomes, |_| true);
                if failures.is_empty() {
                    return Ok(());
                }
                Err(PolicyViolation {
                    reason: format!(
                        "the deployment to the following stages failed: {:?}. But all must be successful. Have a look at the deployment logs or consider changing the stageWatchPolicy",
                        failures
                    ),
                })
            }
            Self::SubsetSuccess(required) => {
                let failures = failed_stages(outcomes, |o| required.contains(&o.stage));
                if failures.is_empty() {
                    return Ok(());
                }
                Err(PolicyViolation {
                    reason: format!(
                        "the deployment to the following stages must be successful {:?}, but a subset of those failed: {:?}. Have a look at the deployment logs or consider changing the stageWatchPolicy",
                        required, failures
                    ),
                })
            }
            Self::AlwaysPass => Ok(()),
            Self::AtLeastOneSuccessfulDeployment => {
                if outcomes.iter().any(|o| o.succeeded) {
                    return Ok(());
                }
                Err(PolicyViolation {
                    reason: "the deployment to all stages failed. But at least one must be successful. Have a look at the deployment logs or consider changing the stageWatchPolicy".to_string(),
                })
            }
        }
    }
}

fn failed_stages(outcomes: &[StageOutcome], keep: impl Fn(&StageOutcome) -> bool) -> Vec<&str> {
    outcomes
        .iter()
        .filter(|o| !o.succeeded && keep(o))
        .map(|o| o.stage.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stages(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_by_name() {
        assert_eq!(StageWatchPolicy::select("overallSuccess", &[]).unwrap(), StageWatchPolicy::OverallSuccess);
        assert_eq!(StageWatchPolicy::select("alwaysPass", &[]).unwrap(), StageWatchPolicy::AlwaysPass);
        assert_eq!(
            StageWatchPolicy::select("atLeastOneSuccessfulDeployment", &[]).unwrap(),
            StageWatchPolicy::AtLeastOneSuccessfulDeployment
        );
        assert_eq!(
            StageWatchPolicy::select("subsetSuccess", &stages(&["prod"])).unwrap(),
            StageWatchPolicy::SubsetSuccess(stages(&["prod"]))
        );
    }

    #[test]
    fn test_select_rejects_bad_configuration() {
        let err = StageWatchPolicy::select("subsetSuccess", &[]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyRequiredStages { .. }));

        let err = StageWatchPolicy::select("mostlySuccess", &[]).unwrap_err();
        assert_eq!(err.to_string(), "unknown stageWatchPolicy mostlySuccess");
    }

    #[test]
    fn test_overall_success() {
        let policy = StageWatchPolicy::OverallSuccess;
        assert!(policy.evaluate(&[StageOutcome::new("dev", true)]).is_ok());
        let err = policy
            .evaluate(&[StageOutcome::new("dev", true), StageOutcome::new("prod", false)])
            .unwrap_err();
        assert!(err.reason.contains("[\"prod\"]"));
    }

    #[test]
    fn test_subset_success_ignores_unlisted_stages() {
        let policy = StageWatchPolicy::SubsetSuccess(stages(&["prod"]));
        assert!(policy
            .evaluate(&[StageOutcome::new("dev", false), StageOutcome::new("prod", true)])
            .is_ok());
        assert!(policy.evaluate(&[StageOutcome::new("prod", false)]).is_err());
    }

    #[test]
    fn test_at_least_one_and_always_pass() {
        let failed = [StageOutcome::new("dev", false), StageOutcome::new("prod", false)];
        assert!(StageWatchPolicy::AtLeastOneSuccessfulDeployment.evaluate(&failed).is_err());
        assert!(StageWatchPolicy::AtLeastOneSuccessfulDeployment
            .evaluate(&[StageOutcome::new("dev", false), StageOutcome::new("prod", true)])
            .is_ok());
        assert!(StageWatchPolicy::AlwaysPass.evaluate(&failed).is_ok());
    }
}
