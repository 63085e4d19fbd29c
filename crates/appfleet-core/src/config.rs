//! appfleet.toml settings parser.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::DeploymentPolicy;

pub const DEFAULT_API_BASE_URL: &str = "https://api.heroku.com";
pub const DEFAULT_TOKEN_ENV_PREFIX: &str = "HEROKU_TOKEN_";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_APP_NAME: &str = "appfleet";
pub const DEFAULT_REMOTE_CONFIG_KEY: &str = "config";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Environment variable names that make up the local config payload.
    #[serde(default)]
    pub config_keys: Vec<String>,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub remote_config: Option<RemoteConfigSettings>,
    /// Default policy; individual requests override it field by field.
    #[serde(default)]
    pub policy: DeploymentPolicy,
    #[serde(default)]
    pub apps: BTreeMap<String, AppDeploymentConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub api_base_url: String,
    pub token_env_prefix: String,
    pub request_timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_env_prefix: DEFAULT_TOKEN_ENV_PREFIX.to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub app_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfigSettings {
    pub url: String,
    #[serde(default = "default_remote_key")]
    pub key: String,
    /// Name of the env var holding the store's bearer token, if it needs one.
    pub token_env: Option<String>,
}

fn default_remote_key() -> String {
    DEFAULT_REMOTE_CONFIG_KEY.to_string()
}

/// Static deployment settings for one application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDeploymentConfig {
    /// Source tarball the platform builds from.
    pub targz_url: Option<String>,
    pub preferred_account: Option<String>,
    /// Accounts the `best` strategy may choose from. All accounts when unset.
    pub allowed_accounts: Option<Vec<String>>,
}

impl AppDeploymentConfig {
    pub fn artifact_url(&self) -> Option<&str> {
        self.targz_url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn preferred(&self) -> Option<&str> {
        self.preferred_account.as_deref().filter(|a| !a.is_empty())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no config key given")]
    EmptyKey,

    #[error("config key already added: {0}")]
    DuplicateKey(String),
}

impl FleetConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FleetConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Apply `PORT` and `APP_NAME` from the given environment.
    pub fn apply_env_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                "PORT" => {
                    if let Ok(port) = value.parse() {
                        self.server.port = port;
                    }
                }
                "APP_NAME" if !value.is_empty() => self.server.app_name = value,
                _ => {}
            }
        }
    }

    pub fn app(&self, name: &str) -> Option<&AppDeploymentConfig> {
        self.apps.get(name)
    }

    /// Collect the values of `config_keys` from the environment.
    ///
    /// Keys missing from the environment are left out.
    pub fn local_config<I>(&self, vars: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .filter(|(key, _)| self.config_keys.iter().any(|k| k == key))
            .collect()
    }

    /// Register a new config key.
    pub fn add_config_key(&mut self, key: &str) -> Result<(), ConfigError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        if self.config_keys.iter().any(|k| k == key) {
            return Err(ConfigError::DuplicateKey(key.to_string()));
        }
        self.config_keys.push(key.to_string());
        Ok(())
    }
}
