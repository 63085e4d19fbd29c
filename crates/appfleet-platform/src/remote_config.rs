//! Remote key-value configuration store.
//!
//! Documents are `{ "content": { KEY: VALUE, ... } }`. A missing document or
//! a document without `content` both mean nothing is stored under the key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credentials::Token;
use crate::error::{PlatformError, PlatformResult};
use crate::types::ConfigVars;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteConfigDocument {
    #[serde(default)]
    pub content: Option<ConfigVars>,
}

#[async_trait]
pub trait RemoteConfigStore: Send + Sync {
    /// Fetch the content stored under `key`, if any.
    async fn fetch(&self, key: &str) -> PlatformResult<Option<ConfigVars>>;

    /// Replace the content stored under `key`.
    async fn store(&self, key: &str, content: &ConfigVars) -> PlatformResult<()>;
}

/// [`RemoteConfigStore`] backed by a plain HTTP document endpoint.
#[derive(Debug, Clone)]
pub struct HttpConfigStore {
    client: Client,
    base_url: String,
    token: Option<Token>,
}

impl HttpConfigStore {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<Token>,
        timeout: Duration,
    ) -> PlatformResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token,
        })
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token.expose()),
            None => req,
        }
    }
}

#[async_trait]
impl RemoteConfigStore for HttpConfigStore {
    async fn fetch(&self, key: &str) -> PlatformResult<Option<ConfigVars>> {
        let url = self.url(key);
        debug!(%url, "fetching remote config");

        let response = self.authorize(self.client.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Status { status, body });
        }

        let doc: RemoteConfigDocument = response
            .json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))?;
        Ok(doc.content)
    }

    async fn store(&self, key: &str, content: &ConfigVars) -> PlatformResult<()> {
        let url = self.url(key);
        debug!(%url, keys = content.len(), "storing remote config");

        let doc = RemoteConfigDocument {
            content: Some(content.clone()),
        };
        let response = self.authorize(self.client.put(&url)).json(&doc).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Status { status, body });
        }
        Ok(())
    }
}
