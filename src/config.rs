//! Configuration required to build a [`crate::DirectorySdk`].

use std::env;
use std::env::VarError;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::environment::CloudEnvironment;
use crate::http::config::HttpConfig;

pub const TENANT_ID_ENV_NAME: &str = "ENTRA_TENANT_ID";
pub const CLIENT_ID_ENV_NAME: &str = "ENTRA_CLIENT_ID";
pub const CLIENT_SECRET_ENV_NAME: &str = "ENTRA_CLIENT_SECRET";
pub const ISSUER_DOMAIN_ENV_NAME: &str = "ENTRA_ISSUER_DOMAIN";
pub const DEACTIVATED_GROUP_ID_ENV_NAME: &str = "ENTRA_DEACTIVATED_GROUP_ID";
pub const CLOUD_ENV_NAME: &str = "ENTRA_CLOUD";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing required configuration value: `{0}`")]
    Missing(&'static str),
    #[error("invalid value for `{0}`: {1}")]
    Invalid(&'static str, String),
}

/// Client secret of the app registration. Never printed.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSecret(String);

impl ClientSecret {
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl<S: AsRef<str>> From<S> for ClientSecret {
    fn from(secret: S) -> Self {
        ClientSecret(secret.as_ref().to_string())
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientSecret: redacted")
    }
}

/// Everything the SDK needs to reach the tenant.
///
/// Tenant id, client id, client secret and issuer domain are mandatory; building a config
/// without any of them fails. The deactivated group is optional and an empty id counts as unset.
#[derive(Debug, Clone, PartialEq)]
pub struct SdkConfig {
    tenant_id: String,
    client_id: String,
    client_secret: ClientSecret,
    /// Issuer of local account identities, e.g. `contoso.onmicrosoft.com`.
    issuer_domain: String,
    deactivated_group_id: Option<String>,
    environment: CloudEnvironment,
    http: HttpConfig,
}

impl SdkConfig {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        issuer_domain: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let tenant_id = required(TENANT_ID_ENV_NAME, tenant_id.into())?;
        let client_id = required(CLIENT_ID_ENV_NAME, client_id.into())?;
        let client_secret = required(CLIENT_SECRET_ENV_NAME, client_secret.into())?;
        let issuer_domain = required(ISSUER_DOMAIN_ENV_NAME, issuer_domain.into())?;

        Ok(Self {
            tenant_id,
            client_id,
            client_secret: ClientSecret(client_secret),
            issuer_domain,
            deactivated_group_id: None,
            environment: CloudEnvironment::default(),
            http: HttpConfig::default(),
        })
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(env::var)
    }

    /// Reads the configuration through the provided `env_var` lookup.
    pub fn from_env_with<F>(env_var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Result<String, VarError>,
    {
        let value = |k: &'static str| env_var(k).unwrap_or_default();

        let config = Self::new(
            value(TENANT_ID_ENV_NAME),
            value(CLIENT_ID_ENV_NAME),
            value(CLIENT_SECRET_ENV_NAME),
            value(ISSUER_DOMAIN_ENV_NAME),
        )?;
        let environment = match env_var(CLOUD_ENV_NAME) {
            Ok(cloud) if !cloud.trim().is_empty() => CloudEnvironment::try_from(cloud.trim())
                .map_err(|e| ConfigError::Invalid(CLOUD_ENV_NAME, e))?,
            _ => CloudEnvironment::default(),
        };

        Ok(config
            .with_deactivated_group_id(env_var(DEACTIVATED_GROUP_ID_ENV_NAME).ok())
            .with_environment(environment))
    }

    pub fn with_deactivated_group_id(self, group_id: Option<String>) -> Self {
        let deactivated_group_id = group_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        Self {
            deactivated_group_id,
            ..self
        }
    }

    pub fn with_environment(self, environment: CloudEnvironment) -> Self {
        Self {
            environment,
            ..self
        }
    }

    pub fn with_http_config(self, http: HttpConfig) -> Self {
        Self { http, ..self }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &ClientSecret {
        &self.client_secret
    }

    pub fn issuer_domain(&self) -> &str {
        &self.issuer_domain
    }

    pub fn deactivated_group_id(&self) -> Option<&str> {
        self.deactivated_group_id.as_deref()
    }

    pub fn environment(&self) -> &CloudEnvironment {
        &self.environment
    }

    pub fn http(&self) -> &HttpConfig {
        &self.http
    }
}

fn required(name: &'static str, value: String) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(value.to_string())
}
