//! Deployer: sequences one deployment from placement to finished build.
//!
//! ```text
//! deploy(app, policy)
//!   ├── app config ── targz_url
//!   ├── refresh directory
//!   ├── select account ── resolve config ── reconcile placement
//!   ├── create app (unless already placed) ── refresh ── re-lookup
//!   ├── set config vars
//!   └── submit build, poll until terminal or out of tries
//! ```
//!
//! Steps run strictly in order and nothing is rolled back: an app deleted
//! for migration stays deleted if a later step fails.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use appfleet_core::{AppDeploymentConfig, DeploymentPolicy};
use appfleet_placement::{capacities, select_account};
use appfleet_platform::{BuildInfo, ConfigVars, CreateAppRequest, PlatformApi, Token};
use appfleet_rollout::{BuildOrchestrator, BuildOutcome, PollConfig};
use appfleet_state::{AccountDirectory, DirectorySnapshot, RefreshReport};

use crate::config_sync::{ConfigPropagator, ConfigSource};
use crate::error::{DeployError, DeployResult};
use crate::lock::NameLocks;
use crate::migration::{MigrationAction, MigrationController};

/// A deployment that reached a platform-reported build status.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub app: String,
    pub app_id: String,
    pub account: String,
    pub migration: MigrationAction,
    pub config_source: ConfigSource,
    pub build_id: String,
    /// As reported by the platform; not interpreted.
    pub build_status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedApp {
    pub app: String,
    pub account: String,
}

/// The account hosting an app, and the token to act on it with.
struct Placement {
    account: String,
    token: Token,
}

pub struct Deployer {
    platform: Arc<dyn PlatformApi>,
    directory: Arc<AccountDirectory>,
    apps: BTreeMap<String, AppDeploymentConfig>,
    config: ConfigPropagator,
    migration: MigrationController,
    builds: BuildOrchestrator,
    locks: NameLocks,
}

impl Deployer {
    pub fn new(
        platform: Arc<dyn PlatformApi>,
        directory: Arc<AccountDirectory>,
        apps: BTreeMap<String, AppDeploymentConfig>,
        config: ConfigPropagator,
    ) -> Self {
        Self {
            migration: MigrationController::new(platform.clone()),
            builds: BuildOrchestrator::new(platform.clone()),
            platform,
            directory,
            apps,
            config,
            locks: NameLocks::new(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.builds = BuildOrchestrator::new(self.platform.clone()).with_config(poll);
        self
    }

    pub fn directory(&self) -> &Arc<AccountDirectory> {
        &self.directory
    }

    pub fn config(&self) -> &ConfigPropagator {
        &self.config
    }

    pub fn app_names(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    pub async fn refresh(&self) -> RefreshReport {
        self.directory.refresh().await
    }

    pub async fn snapshot(&self) -> Arc<DirectorySnapshot> {
        self.directory.snapshot().await
    }

    /// Deploy `app` according to `policy`.
    pub async fn deploy(&self, app: &str, policy: &DeploymentPolicy) -> DeployResult<DeployReport> {
        let _guard = self.locks.acquire(app).await;
        info!(
            app,
            selection = %policy.selection_strategy,
            migration = %policy.migration_strategy,
            config = %policy.set_config_strategy,
            "deploy requested"
        );

        let app_config = self
            .apps
            .get(app)
            .ok_or_else(|| DeployError::NoConfigForApp(app.to_string()))?;
        let artifact_url = app_config
            .artifact_url()
            .ok_or_else(|| DeployError::NoArtifactUrl(app.to_string()))?;

        let snapshot = self.directory.refresh_snapshot().await;
        let target = select_account(app, policy, app_config, &capacities(&snapshot))?;
        let placement = target_placement(&snapshot, &target)?;

        let resolved = self.config.resolve(policy.set_config_strategy).await?;

        let migration = self
            .migration
            .reconcile(app, &target, policy.migration_strategy, &snapshot)
            .await?;

        if migration != MigrationAction::AlreadyPlaced {
            let created = self
                .platform
                .create_app(&placement.token, &CreateAppRequest::named(app))
                .await?;
            info!(app, account = %target, id = %created.id, "app created");
        }

        let snapshot = self.directory.refresh_snapshot().await;
        let registry = snapshot.registry();
        let deployed = registry
            .find_by_name(app)
            .filter(|a| a.account == target)
            .ok_or_else(|| DeployError::AppCreationFailed {
                app: app.to_string(),
                account: target.clone(),
            })?;
        debug!(app, id = %deployed.id, account = %target, "app located after refresh");

        self.platform
            .set_config_vars(&placement.token, app, &resolved.vars)
            .await?;
        debug!(app, keys = resolved.vars.len(), source = ?resolved.source, "config vars applied");

        let outcome = self
            .builds
            .submit_and_await(&placement.token, app, artifact_url)
            .await?;

        match outcome {
            BuildOutcome::Finished { build_id, status } => {
                info!(app, account = %target, build = %build_id, %status, "deploy finished");
                Ok(DeployReport {
                    app: app.to_string(),
                    app_id: deployed.id.clone(),
                    account: placement.account,
                    migration,
                    config_source: resolved.source,
                    build_id,
                    build_status: status,
                })
            }
            BuildOutcome::TimedOut { build_id, attempts } => Err(DeployError::BuildTimeout {
                app: app.to_string(),
                build_id,
                attempts,
            }),
        }
    }

    /// Delete `app` from whichever account hosts it.
    pub async fn delete_app(&self, app: &str) -> DeployResult<DeletedApp> {
        let _guard = self.locks.acquire(app).await;
        let placement = self.locate(app).await?;

        self.platform.delete_app(&placement.token, app).await?;
        info!(app, account = %placement.account, "app deleted");

        self.directory.refresh().await;
        Ok(DeletedApp {
            app: app.to_string(),
            account: placement.account,
        })
    }

    pub async fn get_config(&self, app: &str) -> DeployResult<ConfigVars> {
        let placement = self.locate(app).await?;
        Ok(self.platform.get_config_vars(&placement.token, app).await?)
    }

    /// Apply `vars` on top of the app's config vars. Returns the full set.
    pub async fn set_config(&self, app: &str, vars: &ConfigVars) -> DeployResult<ConfigVars> {
        let placement = self.locate(app).await?;
        let updated = self
            .platform
            .set_config_vars(&placement.token, app, vars)
            .await?;
        info!(app, account = %placement.account, keys = vars.len(), "config vars updated");
        Ok(updated)
    }

    pub async fn get_builds(&self, app: &str) -> DeployResult<Vec<BuildInfo>> {
        let placement = self.locate(app).await?;
        Ok(self.platform.list_builds(&placement.token, app).await?)
    }

    /// Find the account hosting `app`, refreshing once if the current
    /// snapshot does not know it.
    async fn locate(&self, app: &str) -> DeployResult<Placement> {
        let snapshot = self.directory.snapshot().await;
        if let Some(found) = owner(&snapshot, app) {
            return Ok(found);
        }
        debug!(app, "app not in snapshot, refreshing");
        let snapshot = self.directory.refresh_snapshot().await;
        owner(&snapshot, app).ok_or_else(|| DeployError::AppNotFound(app.to_string()))
    }
}

fn owner(snapshot: &DirectorySnapshot, app: &str) -> Option<Placement> {
    snapshot
        .registry()
        .find_owning_account(app)
        .map(|account| Placement {
            account: account.name.clone(),
            token: account.token.clone(),
        })
}

fn target_placement(snapshot: &DirectorySnapshot, target: &str) -> DeployResult<Placement> {
    let account = snapshot
        .account(target)
        .ok_or_else(|| DeployError::AccountNotFound(target.to_string()))?;
    if !account.is_ready() {
        warn!(account = target, status = ?account.status, "target account unavailable");
        return Err(DeployError::AccountUnavailable(target.to_string()));
    }
    Ok(Placement {
        account: account.name.clone(),
        token: account.token.clone(),
    })
}
