//! REST client for the platform API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::api::PlatformApi;
use crate::credentials::Token;
use crate::error::{PlatformError, PlatformResult};
use crate::types::*;

pub const DEFAULT_ACCEPT: &str = "application/vnd.heroku+json; version=3";
pub const QUOTA_ACCEPT: &str = "application/vnd.heroku+json; version=3.account-quotas";

/// [`PlatformApi`] over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpPlatform {
    client: Client,
    base_url: String,
}

impl HttpPlatform {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> PlatformResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("appfleet/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, endpoint: &str, token: &Token, accept: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%method, %url, "platform request");
        self.client
            .request(method, url)
            .bearer_auth(token.expose())
            .header(ACCEPT, accept)
    }

    /// Send a request and decode its JSON body.
    ///
    /// Sentinel error objects win over the HTTP status.
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> PlatformResult<T> {
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;
        decode_response(status, &text)
    }
}

/// Interpret a platform response body.
///
/// A body that is not JSON keeps its status: an error page from a proxy is a
/// [`PlatformError::Status`], not a decode failure.
fn decode_response<T: DeserializeOwned>(status: StatusCode, text: &str) -> PlatformResult<T> {
    let body: Value = match serde_json::from_str(text) {
        Ok(body) => body,
        Err(e) if status.is_success() => return Err(PlatformError::Decode(e.to_string())),
        Err(_) => {
            return Err(PlatformError::Status {
                status: status.as_u16(),
                body: text.to_string(),
            });
        }
    };

    if let Some(err) = PlatformError::from_sentinel(&body) {
        return Err(err);
    }
    if !status.is_success() {
        return Err(PlatformError::from_status(status.as_u16(), &body));
    }

    serde_json::from_value(body).map_err(|e| PlatformError::Decode(e.to_string()))
}

#[async_trait]
impl PlatformApi for HttpPlatform {
    async fn get_account(&self, token: &Token) -> PlatformResult<AccountInfo> {
        self.send(self.request(Method::GET, "account", token, DEFAULT_ACCEPT))
            .await
    }

    async fn get_quota(&self, token: &Token, account_id: &str) -> PlatformResult<QuotaReport> {
        let endpoint = format!("accounts/{account_id}/actions/get-quota");
        self.send(self.request(Method::GET, &endpoint, token, QUOTA_ACCEPT))
            .await
    }

    async fn list_apps(&self, token: &Token) -> PlatformResult<Vec<AppInfo>> {
        self.send(self.request(Method::GET, "apps", token, DEFAULT_ACCEPT))
            .await
    }

    async fn create_app(&self, token: &Token, req: &CreateAppRequest) -> PlatformResult<AppInfo> {
        self.send(self.request(Method::POST, "apps", token, DEFAULT_ACCEPT).json(req))
            .await
    }

    async fn delete_app(&self, token: &Token, app: &str) -> PlatformResult<AppInfo> {
        let endpoint = format!("apps/{app}");
        self.send(self.request(Method::DELETE, &endpoint, token, DEFAULT_ACCEPT))
            .await
    }

    async fn get_config_vars(&self, token: &Token, app: &str) -> PlatformResult<ConfigVars> {
        let endpoint = format!("apps/{app}/config-vars");
        self.send(self.request(Method::GET, &endpoint, token, DEFAULT_ACCEPT))
            .await
    }

    async fn set_config_vars(
        &self,
        token: &Token,
        app: &str,
        vars: &ConfigVars,
    ) -> PlatformResult<ConfigVars> {
        let endpoint = format!("apps/{app}/config-vars");
        self.send(
            self.request(Method::PATCH, &endpoint, token, DEFAULT_ACCEPT)
                .json(vars),
        )
        .await
    }

    async fn create_build(
        &self,
        token: &Token,
        app: &str,
        req: &BuildRequest,
    ) -> PlatformResult<BuildInfo> {
        let endpoint = format!("apps/{app}/builds");
        self.send(
            self.request(Method::POST, &endpoint, token, DEFAULT_ACCEPT)
                .json(req),
        )
        .await
    }

    async fn get_build(
        &self,
        token: &Token,
        app: &str,
        build_id: &str,
    ) -> PlatformResult<BuildInfo> {
        let endpoint = format!("apps/{app}/builds/{build_id}");
        self.send(self.request(Method::GET, &endpoint, token, DEFAULT_ACCEPT))
            .await
    }

    async fn list_builds(&self, token: &Token, app: &str) -> PlatformResult<Vec<BuildInfo>> {
        let endpoint = format!("apps/{app}/builds");
        self.send(self.request(Method::GET, &endpoint, token, DEFAULT_ACCEPT))
            .await
    }
}
