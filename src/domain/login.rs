//! Login strategy selection and login command arguments.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use tracing::{debug, warn};

use super::environment::{
    EnvironmentLookup, Orchestrator, OrchestratorDetector, OIDC_REQUEST_TOKEN_ENV_VAR, OIDC_REQUEST_URL_ENV_VAR,
};
use crate::config::GlobalConfiguration;
use crate::error::ConfigError;

/// Gateway URL requiring client certificates
pub const DEFAULT_MTLS_GATEWAY_URL: &str = "https://api.mtls.dwc.tools.sap";

/// Gateway URL used with OIDC tokens
pub const DEFAULT_GATEWAY_URL: &str = "https://api.dwc.tools.sap";

const LOGIN_BASE_ARGS: [&str; 2] = ["config", "login"];

/// How the release CLI authenticates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LoginDescriptor {
    Gateway(GatewayLogin),
    /// Deprecated direct instance login
    Themisto(ThemistoLogin),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayLogin {
    pub gateway_url: String,
    pub project: String,
    pub credential: GatewayCredential,
    pub orchestrator: Orchestrator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "auth", rename_all = "camelCase")]
pub enum GatewayCredential {
    #[serde(rename_all = "camelCase")]
    Certificate { certificate_path: String },
    #[serde(rename_all = "camelCase")]
    Oidc {
        #[serde(skip_serializing)]
        request_token: String,
        request_url: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemistoLogin {
    pub instance_url: String,
    pub certificate_path: String,
}

/// Choose the login strategy from configuration and environment
pub fn select_login(
    global: &GlobalConfiguration,
    env: &dyn EnvironmentLookup,
    orchestrators: &dyn OrchestratorDetector,
) -> Result<LoginDescriptor, ConfigError> {
    if !global.themisto_instance_url.is_empty() {
        warn!("themistoInstanceURL provided. Trying to use the deprecated(!) themisto configuration.");
        if global.themisto_instance_certificate_path.is_empty() {
            return Err(ConfigError::MissingCertificate {
                field: "themistoInstanceCertificatePath".to_string(),
            });
        }
        return Ok(LoginDescriptor::Themisto(ThemistoLogin {
            instance_url: global.themisto_instance_url.clone(),
            certificate_path: global.themisto_instance_certificate_path.clone(),
        }));
    }

    if global.gateway_url.is_empty() {
        return Err(ConfigError::MissingField {
            field: "gatewayURL".to_string(),
        });
    }

    let orchestrator = orchestrators.detect();
    let mut gateway_url = global.gateway_url.clone();
    let credential = if !orchestrator.supports_oidc_federation() || global.use_cert_login {
        if global.gateway_certificate_path.is_empty() {
            return Err(ConfigError::MissingCertificate {
                field: "gatewayCertificatePath".to_string(),
            });
        }
        GatewayCredential::Certificate {
            certificate_path: global.gateway_certificate_path.clone(),
        }
    } else {
        let request_token = required_env(env, OIDC_REQUEST_TOKEN_ENV_VAR)?;
        let request_url = required_env(env, OIDC_REQUEST_URL_ENV_VAR)?;
        // OIDC tokens are not accepted by the mTLS endpoint
        if gateway_url == DEFAULT_MTLS_GATEWAY_URL {
            gateway_url = DEFAULT_GATEWAY_URL.to_string();
        }
        GatewayCredential::Oidc {
            request_token,
            request_url,
        }
    };

    if global.project_name.is_empty() {
        return Err(ConfigError::MissingField {
            field: "projectName".to_string(),
        });
    }

    Ok(LoginDescriptor::Gateway(GatewayLogin {
        gateway_url,
        project: global.project_name.clone(),
        credential,
        orchestrator,
    }))
}

fn required_env(env: &dyn EnvironmentLookup, name: &str) -> Result<String, ConfigError> {
    env.lookup_env(name).ok_or_else(|| ConfigError::MissingEnvironmentVariable {
        name: name.to_string(),
    })
}

impl LoginDescriptor {
    /// Arguments of the release CLI login command
    pub fn login_args(&self) -> Result<Vec<String>, ConfigError> {
        let mut args: Vec<String> = LOGIN_BASE_ARGS.iter().map(|s| s.to_string()).collect();

        match self {
            Self::Themisto(login) => {
                require(&login.instance_url, "ThemistoUrl", "ThemistoLoginDescriptor")?;
                require(&login.certificate_path, "CertificateFilePath", "ThemistoLoginDescriptor")?;
                log_certificate_path(&login.certificate_path);

                args.push(format!("--api={}", login.instance_url));
                args.extend(certificate_args(&login.certificate_path));
            }
            Self::Gateway(login) => {
                require(&login.gateway_url, "GatewayURL", "GatewayLoginDescriptor")?;
                let auth_args = match &login.credential {
                    GatewayCredential::Certificate { certificate_path } => {
                        require(certificate_path, "CertificateFilePath", "GatewayLoginDescriptor")?;
                        log_certificate_path(certificate_path);
                        certificate_args(certificate_path)
                    }
                    GatewayCredential::Oidc {
                        request_token,
                        request_url,
                    } => {
                        require(request_token, "ActionsIdTokenRequestToken", "GatewayLoginDescriptor")?;
                        require(request_url, "ActionsIdTokenRequestUrl", "GatewayLoginDescriptor")?;
                        vec![
                            "--auth=oidc".to_string(),
                            format!("--github-action-token={}", request_token),
                            format!("--oidc-issuer-url={}", request_url),
                        ]
                    }
                };
                require(&login.project, "Project", "GatewayLoginDescriptor")?;
                debug!("project: {}", login.project);

                args.push(format!("--gateway={}", login.gateway_url));
                args.push(format!("--project={}", login.project));
                args.extend(auth_args);
            }
        }
        Ok(args)
    }
}

fn require(value: &str, property: &'static str, descriptor: &'static str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::LoginProperty { property, descriptor });
    }
    Ok(())
}

fn certificate_args(path: &str) -> Vec<String> {
    vec![
        "--auth=cert".to_string(),
        format!("--cert={}", path),
        format!("--key={}", path),
    ]
}

fn log_certificate_path(path: &str) {
    debug!("certificate file path: {}", path);
    debug!("certificate file path (base64): {}", STANDARD.encode(path));
}
