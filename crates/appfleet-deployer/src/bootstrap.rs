//! Process wiring: builds a [`Deployer`] from the settings file.
//!
//! Called once at startup by both binaries. The environment is read here
//! for local config values and the remote store token; account tokens are
//! rediscovered from the environment on every refresh.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use appfleet_core::FleetConfig;
use appfleet_platform::{HttpConfigStore, HttpPlatform, PlatformApi, Token};
use appfleet_state::{AccountDirectory, CredentialSource};

use crate::config_sync::ConfigPropagator;
use crate::coordinator::Deployer;
use crate::error::DeployResult;

impl Deployer {
    /// Wire a deployer against the real platform.
    pub fn from_settings<I>(settings: &FleetConfig, vars: I) -> DeployResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let timeout = Duration::from_secs(settings.platform.request_timeout_secs);

        let platform: Arc<dyn PlatformApi> =
            Arc::new(HttpPlatform::new(&settings.platform.api_base_url, timeout)?);
        let directory = Arc::new(AccountDirectory::new(
            platform.clone(),
            CredentialSource::Environment {
                prefix: settings.platform.token_env_prefix.clone(),
            },
        ));

        let mut config = ConfigPropagator::new(settings.local_config(vars.iter().cloned()));
        if let Some(remote) = &settings.remote_config {
            let token = remote.token_env.as_ref().and_then(|name| {
                vars.iter()
                    .find(|(key, value)| key == name && !value.is_empty())
                    .map(|(_, value)| Token::new(value.clone()))
            });
            let store = HttpConfigStore::new(&remote.url, token, timeout)?;
            config = config.with_remote(Arc::new(store), remote.key.clone());
        }

        info!(
            api = %settings.platform.api_base_url,
            apps = settings.apps.len(),
            local_keys = config.local().len(),
            remote_config = settings.remote_config.is_some(),
            "deployer configured"
        );

        Ok(Deployer::new(platform, directory, settings.apps.clone(), config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appfleet_core::RemoteConfigSettings;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn wires_local_config_from_listed_keys() {
        let settings = FleetConfig {
            config_keys: vec!["DATABASE_URL".to_string()],
            ..FleetConfig::default()
        };
        let deployer = Deployer::from_settings(
            &settings,
            vars(&[("DATABASE_URL", "postgres://db"), ("OTHER", "x")]),
        )
        .unwrap();
        assert_eq!(deployer.config().local().len(), 1);
        assert_eq!(deployer.config().local()["DATABASE_URL"], "postgres://db");
    }

    #[test]
    fn wires_remote_store_key() {
        let settings = FleetConfig {
            remote_config: Some(RemoteConfigSettings {
                url: "https://config.example.com/docs".to_string(),
                key: "fleet".to_string(),
                token_env: Some("CONFIG_TOKEN".to_string()),
            }),
            ..FleetConfig::default()
        };
        let deployer = Deployer::from_settings(&settings, vars(&[("CONFIG_TOKEN", "t")])).unwrap();
        assert_eq!(deployer.config().key(), "fleet");
    }
}
