//! Migration controller: reconciles where an app is with where it should be.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use appfleet_core::MigrationStrategy;
use appfleet_platform::PlatformApi;
use appfleet_state::DirectorySnapshot;

use crate::error::{DeployError, DeployResult};

/// What reconciling did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MigrationAction {
    /// The app does not exist anywhere yet.
    FreshPlacement,
    /// The app already lives on the target account.
    AlreadyPlaced,
    /// The app was deleted from `from` so it can be recreated on the target.
    Relocated { from: String },
}

pub struct MigrationController {
    platform: Arc<dyn PlatformApi>,
}

impl MigrationController {
    pub fn new(platform: Arc<dyn PlatformApi>) -> Self {
        Self { platform }
    }

    /// Make `target` the only account `app` may be created on.
    ///
    /// App names are platform-global, so an app on another account has to
    /// go before it can be created on `target`. Only the `external`
    /// strategy does that, and it is destructive: build history and the
    /// running release on the old account are lost.
    pub async fn reconcile(
        &self,
        app: &str,
        target: &str,
        strategy: MigrationStrategy,
        snapshot: &DirectorySnapshot,
    ) -> DeployResult<MigrationAction> {
        let Some(current) = snapshot.registry().find_owning_account(app) else {
            return Ok(MigrationAction::FreshPlacement);
        };
        if current.name == target {
            return Ok(MigrationAction::AlreadyPlaced);
        }

        match strategy {
            MigrationStrategy::Disabled => {
                warn!(
                    app,
                    current = %current.name,
                    wanted = target,
                    "cross-account placement with migration disabled"
                );
                Err(DeployError::CrossAccountConflict {
                    app: app.to_string(),
                    current: current.name.clone(),
                    target: target.to_string(),
                })
            }
            MigrationStrategy::Internal => Err(DeployError::MigrationNotImplemented {
                app: app.to_string(),
                current: current.name.clone(),
                target: target.to_string(),
            }),
            MigrationStrategy::External => {
                info!(app, from = %current.name, to = target, "deleting app for migration");
                self.platform.delete_app(&current.token, app).await?;
                Ok(MigrationAction::Relocated {
                    from: current.name.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appfleet_platform::{Credential, MemoryPlatform, PlatformCall};
    use appfleet_state::{AccountDirectory, CredentialSource};

    async fn setup() -> (MemoryPlatform, MigrationController, Arc<DirectorySnapshot>) {
        let platform = MemoryPlatform::new();
        platform.add_account("A", "tok-a", 1000, 0).await;
        platform.add_account("B", "tok-b", 1000, 0).await;
        platform.add_app("B", "myapp", 0).await;

        let directory = AccountDirectory::new(
            Arc::new(platform.clone()),
            CredentialSource::Static(vec![
                Credential::new("A", "tok-a"),
                Credential::new("B", "tok-b"),
            ]),
        );
        directory.refresh().await;
        let snapshot = directory.snapshot().await;
        platform.clear_calls().await;

        (platform.clone(), MigrationController::new(Arc::new(platform)), snapshot)
    }

    #[tokio::test]
    async fn missing_app_is_fresh_placement() {
        let (platform, controller, snapshot) = setup().await;
        let action = controller
            .reconcile("newapp", "A", MigrationStrategy::Disabled, &snapshot)
            .await
            .unwrap();
        assert_eq!(action, MigrationAction::FreshPlacement);
        assert!(platform.calls().await.is_empty());
    }

    #[tokio::test]
    async fn same_account_makes_no_mutating_calls() {
        let (platform, controller, snapshot) = setup().await;
        for strategy in [
            MigrationStrategy::External,
            MigrationStrategy::Internal,
            MigrationStrategy::Disabled,
        ] {
            let action = controller
                .reconcile("myapp", "B", strategy, &snapshot)
                .await
                .unwrap();
            assert_eq!(action, MigrationAction::AlreadyPlaced);
        }
        assert!(platform.mutating_calls().await.is_empty());
    }

    #[tokio::test]
    async fn disabled_is_a_conflict() {
        let (platform, controller, snapshot) = setup().await;
        let err = controller
            .reconcile("myapp", "A", MigrationStrategy::Disabled, &snapshot)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::CrossAccountConflict { .. }));
        assert!(platform.mutating_calls().await.is_empty());
    }

    #[tokio::test]
    async fn internal_is_not_implemented() {
        let (platform, controller, snapshot) = setup().await;
        let err = controller
            .reconcile("myapp", "A", MigrationStrategy::Internal, &snapshot)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::MigrationNotImplemented { .. }));
        assert!(platform.mutating_calls().await.is_empty());
    }

    #[tokio::test]
    async fn external_deletes_from_current_account() {
        let (platform, controller, snapshot) = setup().await;
        let action = controller
            .reconcile("myapp", "A", MigrationStrategy::External, &snapshot)
            .await
            .unwrap();
        assert_eq!(action, MigrationAction::Relocated { from: "B".to_string() });
        assert_eq!(
            platform.mutating_calls().await,
            vec![PlatformCall::DeleteApp {
                account: "B".into(),
                app: "myapp".into()
            }]
        );
        assert!(platform.apps_of("B").await.is_empty());
    }
}
