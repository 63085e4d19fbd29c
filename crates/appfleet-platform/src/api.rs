use async_trait::async_trait;

use crate::credentials::Token;
use crate::error::PlatformResult;
use crate::types::*;

/// Operations appfleet needs from the hosting platform.
///
/// Every call is scoped to one account by its bearer token. `app` arguments
/// accept either the app's id or its (platform-global) name.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn get_account(&self, token: &Token) -> PlatformResult<AccountInfo>;

    async fn get_quota(&self, token: &Token, account_id: &str) -> PlatformResult<QuotaReport>;

    async fn list_apps(&self, token: &Token) -> PlatformResult<Vec<AppInfo>>;

    async fn create_app(&self, token: &Token, req: &CreateAppRequest) -> PlatformResult<AppInfo>;

    async fn delete_app(&self, token: &Token, app: &str) -> PlatformResult<AppInfo>;

    async fn get_config_vars(&self, token: &Token, app: &str) -> PlatformResult<ConfigVars>;

    /// Merge `vars` into the app's config vars and return the full set.
    async fn set_config_vars(
        &self,
        token: &Token,
        app: &str,
        vars: &ConfigVars,
    ) -> PlatformResult<ConfigVars>;

    async fn create_build(
        &self,
        token: &Token,
        app: &str,
        req: &BuildRequest,
    ) -> PlatformResult<BuildInfo>;

    async fn get_build(&self, token: &Token, app: &str, build_id: &str)
    -> PlatformResult<BuildInfo>;

    async fn list_builds(&self, token: &Token, app: &str) -> PlatformResult<Vec<BuildInfo>>;
}
