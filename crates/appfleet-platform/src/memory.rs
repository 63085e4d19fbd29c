//! In-process platform and config store.
//!
//! Both fakes keep their state behind `Arc` locks, so clones share it: hand
//! one clone to the code under test and keep another to arrange state and
//! inspect the recorded calls.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::api::PlatformApi;
use crate::credentials::Token;
use crate::error::{PlatformError, PlatformResult};
use crate::remote_config::RemoteConfigStore;
use crate::types::*;

/// One recorded platform call, labelled with the account that made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    GetAccount { account: String },
    GetQuota { account: String },
    ListApps { account: String },
    CreateApp { account: String, app: String },
    DeleteApp { account: String, app: String },
    GetConfigVars { account: String, app: String },
    SetConfigVars { account: String, app: String },
    CreateBuild { account: String, app: String, url: String },
    GetBuild { account: String, app: String, build_id: String },
    ListBuilds { account: String, app: String },
}

impl PlatformCall {
    /// Whether the call changes platform state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::CreateApp { .. }
                | Self::DeleteApp { .. }
                | Self::SetConfigVars { .. }
                | Self::CreateBuild { .. }
        )
    }
}

#[derive(Debug, Clone)]
struct MemoryBuild {
    info: BuildInfo,
    statuses: Vec<String>,
    polls: usize,
}

#[derive(Debug, Clone)]
struct MemoryApp {
    info: AppInfo,
    quota_used: i64,
    config: ConfigVars,
    builds: Vec<MemoryBuild>,
}

#[derive(Debug, Clone)]
struct MemoryAccount {
    name: String,
    id: String,
    token: String,
    quota_total: i64,
    quota_used: i64,
    apps: Vec<MemoryApp>,
    orphan_quota: Vec<AppQuota>,
    failing: bool,
}

impl MemoryAccount {
    fn app_index(&self, app: &str) -> PlatformResult<usize> {
        self.apps
            .iter()
            .position(|a| a.info.id == app || a.info.name == app)
            .ok_or_else(|| PlatformError::NotFound("Couldn't find that app.".to_string()))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: Vec<MemoryAccount>,
    calls: Vec<PlatformCall>,
    build_script: Vec<String>,
    next_id: u64,
}

impl MemoryState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:04}", self.next_id)
    }

    /// Resolve the calling account, record the call, and fail for broken accounts.
    fn enter(
        &mut self,
        token: &Token,
        call: impl FnOnce(String) -> PlatformCall,
    ) -> PlatformResult<usize> {
        let idx = self
            .accounts
            .iter()
            .position(|a| a.token == token.expose())
            .ok_or_else(|| PlatformError::Api {
                id: "unauthorized".to_string(),
                message: "Invalid credentials provided.".to_string(),
            })?;
        let account = &self.accounts[idx];
        self.calls.push(call(account.name.clone()));
        if account.failing {
            return Err(PlatformError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(idx)
    }

    fn name_taken(&self, name: &str) -> bool {
        self.accounts
            .iter()
            .any(|acc| acc.apps.iter().any(|a| a.info.name == name))
    }
}

/// In-memory [`PlatformApi`].
#[derive(Debug, Clone, Default)]
pub struct MemoryPlatform {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account reachable with `token`.
    pub async fn add_account(&self, name: &str, token: &str, quota_total: i64, quota_used: i64) {
        let mut state = self.state.lock().await;
        let id = state.next_id("acct");
        state.accounts.push(MemoryAccount {
            name: name.to_string(),
            id,
            token: token.to_string(),
            quota_total,
            quota_used,
            apps: Vec::new(),
            orphan_quota: Vec::new(),
            failing: false,
        });
    }

    /// Place an app on an account. Returns the app id.
    pub async fn add_app(&self, account: &str, app: &str, quota_used: i64) -> String {
        let mut state = self.state.lock().await;
        let id = state.next_id("app");
        if let Some(acc) = state.accounts.iter_mut().find(|a| a.name == account) {
            acc.apps.push(MemoryApp {
                info: app_info(&id, app),
                quota_used,
                config: ConfigVars::new(),
                builds: Vec::new(),
            });
        }
        id
    }

    /// Report quota usage for an app id the account does not list.
    pub async fn add_orphan_quota(&self, account: &str, app_uuid: &str, quota_used: i64) {
        let mut state = self.state.lock().await;
        if let Some(acc) = state.accounts.iter_mut().find(|a| a.name == account) {
            acc.orphan_quota.push(AppQuota {
                app_uuid: app_uuid.to_string(),
                quota_used,
            });
        }
    }

    /// Make every call made with this account's token fail.
    pub async fn fail_account(&self, account: &str) {
        let mut state = self.state.lock().await;
        if let Some(acc) = state.accounts.iter_mut().find(|a| a.name == account) {
            acc.failing = true;
        }
    }

    /// Statuses successive polls of newly submitted builds report. The last
    /// status repeats once the script runs out. Defaults to `succeeded`.
    pub async fn script_builds(&self, statuses: &[&str]) {
        let mut state = self.state.lock().await;
        state.build_script = statuses.iter().map(|s| s.to_string()).collect();
    }

    pub async fn calls(&self) -> Vec<PlatformCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn mutating_calls(&self) -> Vec<PlatformCall> {
        self.calls()
            .await
            .into_iter()
            .filter(PlatformCall::is_mutating)
            .collect()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Names of the apps an account currently hosts.
    pub async fn apps_of(&self, account: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .accounts
            .iter()
            .find(|a| a.name == account)
            .map(|a| a.apps.iter().map(|app| app.info.name.clone()).collect())
            .unwrap_or_default()
    }
}

fn app_info(id: &str, name: &str) -> AppInfo {
    AppInfo {
        id: id.to_string(),
        name: name.to_string(),
        stack: NamedRef {
            name: "heroku-22".to_string(),
        },
        region: NamedRef {
            name: "us".to_string(),
        },
    }
}

#[async_trait]
impl PlatformApi for MemoryPlatform {
    async fn get_account(&self, token: &Token) -> PlatformResult<AccountInfo> {
        let mut state = self.state.lock().await;
        let idx = state.enter(token, |account| PlatformCall::GetAccount { account })?;
        Ok(AccountInfo {
            id: state.accounts[idx].id.clone(),
            email: None,
        })
    }

    async fn get_quota(&self, token: &Token, account_id: &str) -> PlatformResult<QuotaReport> {
        let mut state = self.state.lock().await;
        let idx = state.enter(token, |account| PlatformCall::GetQuota { account })?;
        let acc = &state.accounts[idx];
        if acc.id != account_id {
            return Err(PlatformError::NotFound("Couldn't find that account.".to_string()));
        }

        let mut apps: Vec<AppQuota> = acc
            .apps
            .iter()
            .map(|a| AppQuota {
                app_uuid: a.info.id.clone(),
                quota_used: a.quota_used,
            })
            .collect();
        apps.extend(acc.orphan_quota.iter().cloned());

        Ok(QuotaReport {
            account_quota: acc.quota_total,
            quota_used: acc.quota_used,
            apps,
        })
    }

    async fn list_apps(&self, token: &Token) -> PlatformResult<Vec<AppInfo>> {
        let mut state = self.state.lock().await;
        let idx = state.enter(token, |account| PlatformCall::ListApps { account })?;
        Ok(state.accounts[idx]
            .apps
            .iter()
            .map(|a| a.info.clone())
            .collect())
    }

    async fn create_app(&self, token: &Token, req: &CreateAppRequest) -> PlatformResult<AppInfo> {
        let mut state = self.state.lock().await;
        let idx = state.enter(token, |account| PlatformCall::CreateApp {
            account,
            app: req.name.clone(),
        })?;
        if req.name.is_empty() {
            return Err(PlatformError::InvalidParams("Name is required.".to_string()));
        }
        if state.name_taken(&req.name) {
            return Err(PlatformError::InvalidParams("Name is already taken".to_string()));
        }

        let id = state.next_id("app");
        let info = app_info(&id, &req.name);
        state.accounts[idx].apps.push(MemoryApp {
            info: info.clone(),
            quota_used: 0,
            config: ConfigVars::new(),
            builds: Vec::new(),
        });
        Ok(info)
    }

    async fn delete_app(&self, token: &Token, app: &str) -> PlatformResult<AppInfo> {
        let mut state = self.state.lock().await;
        let idx = state.enter(token, |account| PlatformCall::DeleteApp {
            account,
            app: app.to_string(),
        })?;
        let pos = state.accounts[idx].app_index(app)?;
        Ok(state.accounts[idx].apps.remove(pos).info)
    }

    async fn get_config_vars(&self, token: &Token, app: &str) -> PlatformResult<ConfigVars> {
        let mut state = self.state.lock().await;
        let idx = state.enter(token, |account| PlatformCall::GetConfigVars {
            account,
            app: app.to_string(),
        })?;
        let pos = state.accounts[idx].app_index(app)?;
        Ok(state.accounts[idx].apps[pos].config.clone())
    }

    async fn set_config_vars(
        &self,
        token: &Token,
        app: &str,
        vars: &ConfigVars,
    ) -> PlatformResult<ConfigVars> {
        let mut state = self.state.lock().await;
        let idx = state.enter(token, |account| PlatformCall::SetConfigVars {
            account,
            app: app.to_string(),
        })?;
        let pos = state.accounts[idx].app_index(app)?;
        let config = &mut state.accounts[idx].apps[pos].config;
        config.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(config.clone())
    }

    async fn create_build(
        &self,
        token: &Token,
        app: &str,
        req: &BuildRequest,
    ) -> PlatformResult<BuildInfo> {
        let mut state = self.state.lock().await;
        let idx = state.enter(token, |account| PlatformCall::CreateBuild {
            account,
            app: app.to_string(),
            url: req.source_blob.url.clone(),
        })?;
        let pos = state.accounts[idx].app_index(app)?;
        if req.source_blob.url.is_empty() {
            return Err(PlatformError::InvalidParams("source_blob.url is required".to_string()));
        }

        let id = state.next_id("build");
        let statuses = if state.build_script.is_empty() {
            vec!["succeeded".to_string()]
        } else {
            state.build_script.clone()
        };
        let info = BuildInfo {
            id,
            status: BUILD_PENDING.to_string(),
            created_at: None,
            output_stream_url: None,
        };
        state.accounts[idx].apps[pos].builds.push(MemoryBuild {
            info: info.clone(),
            statuses,
            polls: 0,
        });
        Ok(info)
    }

    async fn get_build(
        &self,
        token: &Token,
        app: &str,
        build_id: &str,
    ) -> PlatformResult<BuildInfo> {
        let mut state = self.state.lock().await;
        let idx = state.enter(token, |account| PlatformCall::GetBuild {
            account,
            app: app.to_string(),
            build_id: build_id.to_string(),
        })?;
        let pos = state.accounts[idx].app_index(app)?;
        let build = state.accounts[idx].apps[pos]
            .builds
            .iter_mut()
            .find(|b| b.info.id == build_id)
            .ok_or_else(|| PlatformError::NotFound("Couldn't find that build.".to_string()))?;

        let step = build.polls.min(build.statuses.len().saturating_sub(1));
        if let Some(status) = build.statuses.get(step) {
            build.info.status = status.clone();
        }
        build.polls += 1;
        Ok(build.info.clone())
    }

    async fn list_builds(&self, token: &Token, app: &str) -> PlatformResult<Vec<BuildInfo>> {
        let mut state = self.state.lock().await;
        let idx = state.enter(token, |account| PlatformCall::ListBuilds {
            account,
            app: app.to_string(),
        })?;
        let pos = state.accounts[idx].app_index(app)?;
        Ok(state.accounts[idx].apps[pos]
            .builds
            .iter()
            .map(|b| b.info.clone())
            .collect())
    }
}

/// In-memory [`RemoteConfigStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    docs: Arc<RwLock<HashMap<String, ConfigVars>>>,
    unreachable: Arc<AtomicBool>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every fetch and store fail as if the store were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> PlatformResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(PlatformError::Status {
                status: 503,
                body: "config store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteConfigStore for MemoryConfigStore {
    async fn fetch(&self, key: &str) -> PlatformResult<Option<ConfigVars>> {
        self.check_reachable()?;
        Ok(self.docs.read().await.get(key).cloned())
    }

    async fn store(&self, key: &str, content: &ConfigVars) -> PlatformResult<()> {
        self.check_reachable()?;
        self.docs
            .write()
            .await
            .insert(key.to_string(), content.clone());
        Ok(())
    }
}
