//! Project-wide release settings.

use serde::{Deserialize, Serialize};

/// Rule deriving an auxiliary download URL from an artifact locator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct DeriveAdditionalDownloadUrlsEntry {
    /// Key under which the derived URL is published
    pub key: String,

    /// Regular expression applied to the locator
    pub find_pattern: String,

    /// Replacement template, `$N` refers to capture group N
    pub replace_with: String,
}

/// Global configuration shared by every artifact of one release run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalConfiguration {
    #[serde(rename = "artifactURLs")]
    pub artifact_urls: Vec<String>,

    pub artifact_version: String,

    /// Pre-installed CLI binary; when empty the CLI is installed for the run
    pub cli_path: String,

    #[serde(rename = "deriveAdditionalDownloadURLs")]
    pub derive_additional_download_urls: Vec<DeriveAdditionalDownloadUrlsEntry>,

    pub downloaded_archives_path: String,

    pub gateway_certificate_path: String,

    #[serde(rename = "gatewayURL")]
    pub gateway_url: String,

    #[serde(skip_serializing)]
    pub github_token: String,

    pub helm_chart_directory: String,

    #[serde(rename = "helmChartURL")]
    pub helm_chart_url: String,

    pub mtar_file_path: String,

    #[serde(rename = "mtarUIPath")]
    pub mtar_ui_path: String,

    pub project_name: String,

    pub required_successful_stages: Vec<String>,

    pub stages_to_watch: Vec<String>,

    pub stage_watch_policy: String,

    pub themisto_instance_certificate_path: String,

    #[serde(rename = "themistoInstanceURL")]
    pub themisto_instance_url: String,

    /// Force certificate login even where OIDC federation is available
    pub use_cert_login: bool,

    pub watch_resource_of_interest: bool,

    pub vault_base_path: String,

    pub vault_pipeline_name: String,

    #[serde(rename = "pipelineID")]
    pub pipeline_id: String,

    pub cumulus_pipeline_run_key: String,
}

impl GlobalConfiguration {
    /// Look up a string-typed parameter by its metadata name.
    ///
    /// Returns `None` for names that are not string parameters of the
    /// global configuration.
    pub fn string_parameter(&self, name: &str) -> Option<&str> {
        let value = match name {
            "artifactVersion" => &self.artifact_version,
            "cliPath" => &self.cli_path,
            "downloadedArchivesPath" => &self.downloaded_archives_path,
            "gatewayCertificatePath" => &self.gateway_certificate_path,
            "gatewayURL" => &self.gateway_url,
            "githubToken" => &self.github_token,
            "helmChartDirectory" => &self.helm_chart_directory,
            "helmChartURL" => &self.helm_chart_url,
            "mtarFilePath" => &self.mtar_file_path,
            "mtarUIPath" => &self.mtar_ui_path,
            "projectName" => &self.project_name,
            "stageWatchPolicy" => &self.stage_watch_policy,
            "themistoInstanceCertificatePath" => &self.themisto_instance_certificate_path,
            "themistoInstanceURL" => &self.themisto_instance_url,
            "vaultBasePath" => &self.vault_base_path,
            "vaultPipelineName" => &self.vault_pipeline_name,
            "pipelineID" => &self.pipeline_id,
            "cumulusPipelineRunKey" => &self.cumulus_pipeline_run_key,
            _ => return None,
        };
        Some(value.as_str())
    }
}
