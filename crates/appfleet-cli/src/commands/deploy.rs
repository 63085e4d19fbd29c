use std::path::Path;

use appfleet_core::{DeploymentPolicy, MigrationStrategy, SelectionStrategy, SetConfigStrategy};
use appfleet_deployer::{DeployError, MigrationAction};

/// Command-line overrides for the settings file's `[policy]`.
#[derive(Debug, Default)]
pub struct PolicyFlags {
    pub selection: Option<SelectionStrategy>,
    pub migration: Option<MigrationStrategy>,
    pub set_config: Option<SetConfigStrategy>,
    pub deploy_to: Option<String>,
}

impl PolicyFlags {
    fn apply(self, mut policy: DeploymentPolicy) -> DeploymentPolicy {
        if let Some(selection) = self.selection {
            policy.selection_strategy = selection;
        }
        if let Some(migration) = self.migration {
            policy.migration_strategy = migration;
        }
        if let Some(set_config) = self.set_config {
            policy.set_config_strategy = set_config;
        }
        if self.deploy_to.is_some() {
            policy.deploy_to = self.deploy_to;
        }
        policy
    }
}

pub async fn deploy(config: &Path, app: &str, flags: PolicyFlags) -> anyhow::Result<()> {
    let settings = super::load_settings(config)?;
    let policy = flags.apply(settings.policy.clone());
    let deployer = super::deployer(&settings)?;

    println!(
        "Deploying {app} (selection={}, migration={}, config={})",
        policy.selection_strategy, policy.migration_strategy, policy.set_config_strategy
    );

    let report = deployer.deploy(app, &policy).await.map_err(report_failure)?;

    match &report.migration {
        MigrationAction::FreshPlacement => println!("  created on {}", report.account),
        MigrationAction::AlreadyPlaced => println!("  already on {}", report.account),
        MigrationAction::Relocated { from } => {
            println!("  moved from {from} to {}", report.account)
        }
    }
    println!("  config from {:?} store", report.config_source);
    println!(
        "✓ {} build {} {}",
        report.app, report.build_id, report.build_status
    );
    Ok(())
}

pub async fn delete(config: &Path, app: &str) -> anyhow::Result<()> {
    let settings = super::load_settings(config)?;
    let deployer = super::deployer(&settings)?;

    let deleted = deployer.delete_app(app).await.map_err(report_failure)?;
    println!("✓ deleted {} from {}", deleted.app, deleted.account);
    Ok(())
}

fn report_failure(err: DeployError) -> anyhow::Error {
    eprintln!("✗ {} ({})", err.code(), err.kind());
    err.into()
}
