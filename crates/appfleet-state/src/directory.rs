//! AccountDirectory: the refreshed set of platform accounts.
//!
//! `refresh()` is the only thing that changes account quota and app
//! ownership. It discovers credentials, fans out one task per account,
//! joins them in discovery order, and swaps in a brand new snapshot.
//!
//! Refreshes may overlap. Each one takes a generation number when it starts
//! and only installs its snapshot if no later refresh has installed one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use appfleet_platform::{
    Credential, PlatformApi, PlatformResult, QuotaReport, discover_credentials,
};

use crate::registry::DirectorySnapshot;
use crate::types::{Account, AccountStatus, Application};

/// Where account credentials come from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Process environment entries whose key starts with `prefix`.
    Environment { prefix: String },
    /// A fixed credential list.
    Static(Vec<Credential>),
}

impl CredentialSource {
    pub fn load(&self) -> Vec<Credential> {
        match self {
            CredentialSource::Environment { prefix } => {
                discover_credentials(std::env::vars(), prefix)
            }
            CredentialSource::Static(credentials) => credentials.clone(),
        }
    }
}

/// Summary of one refresh.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RefreshReport {
    pub accounts: usize,
    pub applications: usize,
    /// Accounts the refresh could not reach.
    pub unavailable: Vec<String>,
    /// Quota line items that named an app the account does not list.
    pub quota_mismatches: usize,
}

/// Everything fetched for one account.
struct AccountRefresh {
    account: Account,
    apps: Vec<Application>,
    mismatches: usize,
}

/// The installed snapshot and the generation of the refresh that built it.
struct Installed {
    generation: u64,
    snapshot: Arc<DirectorySnapshot>,
}

/// The directory of platform accounts.
pub struct AccountDirectory {
    platform: Arc<dyn PlatformApi>,
    credentials: CredentialSource,
    generations: AtomicU64,
    installed: RwLock<Installed>,
}

impl AccountDirectory {
    /// Create an empty directory. Nothing is known until the first refresh.
    pub fn new(platform: Arc<dyn PlatformApi>, credentials: CredentialSource) -> Self {
        Self {
            platform,
            credentials,
            generations: AtomicU64::new(0),
            installed: RwLock::new(Installed {
                generation: 0,
                snapshot: Arc::new(DirectorySnapshot::default()),
            }),
        }
    }

    /// The current snapshot.
    pub async fn snapshot(&self) -> Arc<DirectorySnapshot> {
        self.installed.read().await.snapshot.clone()
    }

    /// Rebuild the directory from the platform.
    ///
    /// Accounts are fetched concurrently. An account that fails stays in the
    /// directory as `Unavailable` with no applications; the others are
    /// unaffected.
    pub async fn refresh(&self) -> RefreshReport {
        self.rebuild().await.0
    }

    /// Refresh and return the snapshot current afterwards.
    ///
    /// That is this refresh's snapshot, or a newer one if a refresh that
    /// started later finished first.
    pub async fn refresh_snapshot(&self) -> Arc<DirectorySnapshot> {
        self.rebuild().await.1
    }

    async fn rebuild(&self) -> (RefreshReport, Arc<DirectorySnapshot>) {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let credentials = self.credentials.load();
        debug!(accounts = credentials.len(), generation, "refreshing account directory");

        let handles: Vec<_> = credentials
            .iter()
            .cloned()
            .map(|credential| {
                let platform = self.platform.clone();
                tokio::spawn(async move { fetch_account(platform.as_ref(), &credential).await })
            })
            .collect();

        let mut report = RefreshReport::default();
        let mut accounts = Vec::with_capacity(credentials.len());
        let mut applications = Vec::new();

        for (credential, handle) in credentials.into_iter().zip(handles) {
            let reason = match handle.await {
                Ok(Ok(fetched)) => {
                    report.quota_mismatches += fetched.mismatches;
                    accounts.push(fetched.account);
                    applications.extend(fetched.apps);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(e) => format!("refresh task failed: {e}"),
            };

            warn!(account = %credential.account, %reason, "account refresh failed");
            report.unavailable.push(credential.account.clone());
            accounts.push(Account {
                name: credential.account,
                env_key: credential.env_key,
                token: credential.token,
                id: None,
                quota_total: 0,
                quota_used: 0,
                status: AccountStatus::Unavailable { reason },
            });
        }

        report.accounts = accounts.len();
        report.applications = applications.len();

        let snapshot = Arc::new(DirectorySnapshot::new(accounts, applications));
        let mut installed = self.installed.write().await;
        if generation < installed.generation {
            debug!(
                generation,
                installed = installed.generation,
                "newer refresh already installed, discarding"
            );
            return (report, installed.snapshot.clone());
        }
        *installed = Installed {
            generation,
            snapshot: snapshot.clone(),
        };
        drop(installed);

        info!(
            accounts = report.accounts,
            applications = report.applications,
            unavailable = report.unavailable.len(),
            "account directory refreshed"
        );
        (report, snapshot)
    }
}

/// Fetch identity, quota and apps for one account.
async fn fetch_account(
    platform: &dyn PlatformApi,
    credential: &Credential,
) -> PlatformResult<AccountRefresh> {
    let info = platform.get_account(&credential.token).await?;
    let (quota, listed) = tokio::try_join!(
        platform.get_quota(&credential.token, &info.id),
        platform.list_apps(&credential.token),
    )?;

    let mut apps: Vec<Application> = listed
        .into_iter()
        .map(|app| Application::from_info(app, &credential.account))
        .collect();
    let mismatches = assign_quota(&credential.account, &quota, &mut apps);

    debug!(
        account = %credential.account,
        apps = apps.len(),
        quota_used = quota.quota_used,
        quota_total = quota.account_quota,
        "account fetched"
    );

    Ok(AccountRefresh {
        account: Account {
            name: credential.account.clone(),
            env_key: credential.env_key.clone(),
            token: credential.token.clone(),
            id: Some(info.id),
            quota_total: quota.account_quota,
            quota_used: quota.quota_used,
            status: AccountStatus::Ready,
        },
        apps,
        mismatches,
    })
}

/// Copy each quota line item onto the app with the matching id.
///
/// Returns the number of line items that matched no app.
fn assign_quota(account: &str, quota: &QuotaReport, apps: &mut [Application]) -> usize {
    let mut mismatches = 0;
    for line in &quota.apps {
        match apps.iter_mut().find(|app| app.id == line.app_uuid) {
            Some(app) => app.quota_used = line.quota_used,
            None => {
                mismatches += 1;
                warn!(
                    %account,
                    app_uuid = %line.app_uuid,
                    quota_used = line.quota_used,
                    "quota line item not among account apps"
                );
            }
        }
    }
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use appfleet_platform::{
        AccountInfo, AppInfo, BuildInfo, BuildRequest, ConfigVars, CreateAppRequest,
        MemoryPlatform, PlatformCall, Token,
    };

    async fn setup() -> (MemoryPlatform, AccountDirectory) {
        let platform = MemoryPlatform::new();
        platform.add_account("A", "tok-a", 1000, 300).await;
        platform.add_account("B", "tok-b", 500, 600).await;
        platform.add_app("A", "alpha", 200).await;
        platform.add_app("A", "beta", 100).await;
        platform.add_app("B", "gamma", 600).await;

        let directory = AccountDirectory::new(
            Arc::new(platform.clone()),
            CredentialSource::Static(vec![
                Credential::new("A", "tok-a"),
                Credential::new("B", "tok-b"),
            ]),
        );
        (platform, directory)
    }

    #[tokio::test]
    async fn starts_empty() {
        let (_, directory) = setup().await;
        assert!(directory.snapshot().await.accounts().is_empty());
    }

    #[tokio::test]
    async fn refresh_builds_accounts_and_apps() {
        let (_, directory) = setup().await;
        let report = directory.refresh().await;
        assert_eq!(report.accounts, 2);
        assert_eq!(report.applications, 3);
        assert!(report.unavailable.is_empty());

        let snapshot = directory.snapshot().await;
        let b = snapshot.account("B").unwrap();
        assert_eq!(b.quota_remaining(), -100);
        assert!(b.id.is_some());

        let alpha = snapshot.registry().find_by_name("alpha").unwrap();
        assert_eq!(alpha.quota_used, 200);
        assert_eq!(alpha.account, "A");
        assert_eq!(alpha.stack, "heroku-22");
    }

    #[tokio::test]
    async fn refresh_replaces_rather_than_merges() {
        let (platform, directory) = setup().await;
        directory.refresh().await;

        platform
            .delete_app(&appfleet_platform::Token::new("tok-a"), "alpha")
            .await
            .unwrap();
        directory.refresh().await;

        let snapshot = directory.snapshot().await;
        assert!(snapshot.registry().find_by_name("alpha").is_none());
        assert_eq!(snapshot.app_count("A"), 1);
    }

    #[tokio::test]
    async fn orphan_quota_is_logged_and_skipped() {
        let (platform, directory) = setup().await;
        platform.add_orphan_quota("A", "app-9999", 42).await;

        let report = directory.refresh().await;
        assert_eq!(report.quota_mismatches, 1);
        assert_eq!(report.applications, 3);
        assert!(directory.snapshot().await.account("A").unwrap().is_ready());
    }

    #[tokio::test]
    async fn failing_account_does_not_block_others() {
        let (platform, directory) = setup().await;
        platform.fail_account("A").await;

        let report = directory.refresh().await;
        assert_eq!(report.unavailable, ["A"]);
        assert_eq!(report.accounts, 2);

        let snapshot = directory.snapshot().await;
        let a = snapshot.account("A").unwrap();
        assert!(matches!(a.status, AccountStatus::Unavailable { .. }));
        assert_eq!(snapshot.app_count("A"), 0);
        assert!(snapshot.account("B").unwrap().is_ready());
        assert_eq!(snapshot.registry().list_all().len(), 1);
    }

    #[tokio::test]
    async fn refresh_only_reads() {
        let (platform, directory) = setup().await;
        directory.refresh().await;
        assert!(platform.mutating_calls().await.is_empty());
        assert!(
            platform
                .calls()
                .await
                .contains(&PlatformCall::GetQuota { account: "B".into() })
        );
    }

    /// Lets the first `list_apps` call read its answer, then holds it until
    /// released.
    struct StalledListing {
        inner: MemoryPlatform,
        listed: std::sync::Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
        release: tokio::sync::Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
    }

    #[async_trait::async_trait]
    impl PlatformApi for StalledListing {
        async fn get_account(&self, token: &Token) -> PlatformResult<AccountInfo> {
            self.inner.get_account(token).await
        }

        async fn get_quota(&self, token: &Token, account_id: &str) -> PlatformResult<QuotaReport> {
            self.inner.get_quota(token, account_id).await
        }

        async fn list_apps(&self, token: &Token) -> PlatformResult<Vec<AppInfo>> {
            let apps = self.inner.list_apps(token).await;
            let release = self.release.lock().await.take();
            if let Some(release) = release {
                let listed = self.listed.lock().unwrap().take();
                if let Some(listed) = listed {
                    let _ = listed.send(());
                }
                let _ = release.await;
            }
            apps
        }

        async fn create_app(&self, token: &Token, req: &CreateAppRequest) -> PlatformResult<AppInfo> {
            self.inner.create_app(token, req).await
        }

        async fn delete_app(&self, token: &Token, app: &str) -> PlatformResult<AppInfo> {
            self.inner.delete_app(token, app).await
        }

        async fn get_config_vars(&self, token: &Token, app: &str) -> PlatformResult<ConfigVars> {
            self.inner.get_config_vars(token, app).await
        }

        async fn set_config_vars(
            &self,
            token: &Token,
            app: &str,
            vars: &ConfigVars,
        ) -> PlatformResult<ConfigVars> {
            self.inner.set_config_vars(token, app, vars).await
        }

        async fn create_build(
            &self,
            token: &Token,
            app: &str,
            req: &BuildRequest,
        ) -> PlatformResult<BuildInfo> {
            self.inner.create_build(token, app, req).await
        }

        async fn get_build(
            &self,
            token: &Token,
            app: &str,
            build_id: &str,
        ) -> PlatformResult<BuildInfo> {
            self.inner.get_build(token, app, build_id).await
        }

        async fn list_builds(&self, token: &Token, app: &str) -> PlatformResult<Vec<BuildInfo>> {
            self.inner.list_builds(token, app).await
        }
    }

    #[tokio::test]
    async fn slower_older_refresh_does_not_replace_newer_snapshot() {
        let platform = MemoryPlatform::new();
        platform.add_account("A", "tok-a", 1000, 0).await;

        let (listed_tx, listed_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel();
        let stalled = StalledListing {
            inner: platform.clone(),
            listed: std::sync::Mutex::new(Some(listed_tx)),
            release: tokio::sync::Mutex::new(Some(release_rx)),
        };
        let directory = Arc::new(AccountDirectory::new(
            Arc::new(stalled),
            CredentialSource::Static(vec![Credential::new("A", "tok-a")]),
        ));

        let older = {
            let directory = directory.clone();
            tokio::spawn(async move { directory.refresh_snapshot().await })
        };
        listed_rx.await.unwrap();

        platform.add_app("A", "myapp", 0).await;
        let newer = directory.refresh_snapshot().await;
        assert!(newer.registry().find_by_name("myapp").is_some());

        release_tx.send(()).unwrap();
        let returned = older.await.unwrap();

        assert!(returned.registry().find_by_name("myapp").is_some());
        let current = directory.snapshot().await;
        assert!(current.registry().find_by_name("myapp").is_some());
        assert!(Arc::ptr_eq(&current, &newer));
    }
}
