//! Config propagator: decides which config vars an app gets.
//!
//! Local config is read from the process environment once, at startup.
//! Remote config lives in a [`RemoteConfigStore`] under a single key.
//! The two are never merged key by key.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use appfleet_core::SetConfigStrategy;
use appfleet_platform::{ConfigVars, RemoteConfigStore};

use crate::error::{DeployError, DeployResult};

/// Where resolved config came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub source: ConfigSource,
    pub vars: ConfigVars,
}

pub struct ConfigPropagator {
    remote: Option<Arc<dyn RemoteConfigStore>>,
    key: String,
    local: ConfigVars,
}

impl ConfigPropagator {
    pub fn new(local: ConfigVars) -> Self {
        Self {
            remote: None,
            key: appfleet_core::config::DEFAULT_REMOTE_CONFIG_KEY.to_string(),
            local,
        }
    }

    pub fn with_remote(mut self, store: Arc<dyn RemoteConfigStore>, key: impl Into<String>) -> Self {
        self.remote = Some(store);
        self.key = key.into();
        self
    }

    pub fn local(&self) -> &ConfigVars {
        &self.local
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Resolve the config payload for `strategy`.
    pub async fn resolve(&self, strategy: SetConfigStrategy) -> DeployResult<ResolvedConfig> {
        match strategy {
            SetConfigStrategy::Local => Ok(self.resolved_local()),

            SetConfigStrategy::Remote => match self.fetch_remote().await? {
                Some(vars) => Ok(ResolvedConfig {
                    source: ConfigSource::Remote,
                    vars,
                }),
                None => Err(DeployError::ConfigUnavailable(format!(
                    "no content stored under key {}",
                    self.key
                ))),
            },

            SetConfigStrategy::Fallback => match self.fetch_remote().await {
                Ok(Some(vars)) => Ok(ResolvedConfig {
                    source: ConfigSource::Remote,
                    vars,
                }),
                Ok(None) => {
                    debug!(key = %self.key, "no remote config, using local");
                    Ok(self.resolved_local())
                }
                Err(e) => {
                    warn!(key = %self.key, error = %e, "remote config unreachable, using local");
                    Ok(self.resolved_local())
                }
            },
        }
    }

    /// Store the local config as the remote config. Returns the key count.
    pub async fn publish(&self) -> DeployResult<usize> {
        let store = self.store()?;
        store
            .store(&self.key, &self.local)
            .await
            .map_err(|e| DeployError::ConfigUnavailable(e.to_string()))?;
        debug!(key = %self.key, keys = self.local.len(), "published local config");
        Ok(self.local.len())
    }

    fn resolved_local(&self) -> ResolvedConfig {
        ResolvedConfig {
            source: ConfigSource::Local,
            vars: self.local.clone(),
        }
    }

    fn store(&self) -> DeployResult<&Arc<dyn RemoteConfigStore>> {
        self.remote
            .as_ref()
            .ok_or_else(|| DeployError::ConfigUnavailable("no remote config store configured".to_string()))
    }

    async fn fetch_remote(&self) -> DeployResult<Option<ConfigVars>> {
        self.store()?
            .fetch(&self.key)
            .await
            .map_err(|e| DeployError::ConfigUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appfleet_platform::MemoryConfigStore;

    fn vars(pairs: &[(&str, &str)]) -> ConfigVars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn propagator(store: &MemoryConfigStore) -> ConfigPropagator {
        ConfigPropagator::new(vars(&[("LOCAL", "1"), ("SHARED", "local")]))
            .with_remote(Arc::new(store.clone()), "config")
    }

    #[tokio::test]
    async fn local_never_touches_remote() {
        let store = MemoryConfigStore::new();
        store.set_unreachable(true);
        let resolved = propagator(&store).resolve(SetConfigStrategy::Local).await.unwrap();
        assert_eq!(resolved.source, ConfigSource::Local);
        assert_eq!(resolved.vars["LOCAL"], "1");
    }

    #[tokio::test]
    async fn remote_without_content_is_unavailable() {
        let store = MemoryConfigStore::new();
        let err = propagator(&store)
            .resolve(SetConfigStrategy::Remote)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::ConfigUnavailable(_)));
    }

    #[tokio::test]
    async fn remote_without_store_is_unavailable() {
        let err = ConfigPropagator::new(ConfigVars::new())
            .resolve(SetConfigStrategy::Remote)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "config_unavailable");
    }

    #[tokio::test]
    async fn fallback_prefers_remote_without_merging() {
        let store = MemoryConfigStore::new();
        store.store("config", &vars(&[("SHARED", "remote")])).await.unwrap();

        let resolved = propagator(&store)
            .resolve(SetConfigStrategy::Fallback)
            .await
            .unwrap();
        assert_eq!(resolved.source, ConfigSource::Remote);
        assert_eq!(resolved.vars, vars(&[("SHARED", "remote")]));
    }

    #[tokio::test]
    async fn fallback_uses_local_when_absent_or_unreachable() {
        let store = MemoryConfigStore::new();
        let propagator = propagator(&store);

        let resolved = propagator.resolve(SetConfigStrategy::Fallback).await.unwrap();
        assert_eq!(resolved.source, ConfigSource::Local);

        store.set_unreachable(true);
        let resolved = propagator.resolve(SetConfigStrategy::Fallback).await.unwrap();
        assert_eq!(resolved.source, ConfigSource::Local);
        assert_eq!(resolved.vars.len(), 2);
    }

    #[tokio::test]
    async fn publish_then_remote_resolves_local_values() {
        let store = MemoryConfigStore::new();
        let propagator = propagator(&store);
        assert_eq!(propagator.publish().await.unwrap(), 2);

        let resolved = propagator.resolve(SetConfigStrategy::Remote).await.unwrap();
        assert_eq!(resolved.source, ConfigSource::Remote);
        assert_eq!(&resolved.vars, propagator.local());
    }
}
