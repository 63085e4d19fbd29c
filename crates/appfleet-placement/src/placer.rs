//! Placement engine: picks the account an application deploys to.
//!
//! - `manual` takes the policy's explicit target
//! - `preferred` takes the application's configured preferred account
//! - `best` takes the top-ranked candidate from [`rank_candidates`]

use thiserror::Error;
use tracing::{debug, info};

use appfleet_core::{AppDeploymentConfig, DeploymentPolicy, SelectionStrategy};

use crate::scorer::{AccountCapacity, rank_candidates};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("manual selection requires a deploy target")]
    MissingTarget,

    #[error("no preferred account configured for {0}")]
    NoPreferredAccount(String),

    #[error("no available account can host {0}")]
    NoAvailableAccount(String),
}

pub type PlacementResult<T> = Result<T, PlacementError>;

/// Select the target account for `app`.
///
/// `accounts` must be in directory order; the `best` strategy breaks ties
/// by it.
pub fn select_account(
    app: &str,
    policy: &DeploymentPolicy,
    app_config: &AppDeploymentConfig,
    accounts: &[AccountCapacity],
) -> PlacementResult<String> {
    let selected = match policy.selection_strategy {
        SelectionStrategy::Manual => policy
            .target()
            .map(str::to_string)
            .ok_or(PlacementError::MissingTarget)?,

        SelectionStrategy::Preferred => app_config
            .preferred()
            .map(str::to_string)
            .ok_or_else(|| PlacementError::NoPreferredAccount(app.to_string()))?,

        SelectionStrategy::Best => {
            let ranked = rank_candidates(accounts, app_config.allowed_accounts.as_deref());
            debug!(
                app,
                candidates = ranked.len(),
                "ranked candidate accounts"
            );
            ranked
                .first()
                .map(|a| a.account.clone())
                .ok_or_else(|| PlacementError::NoAvailableAccount(app.to_string()))?
        }
    };

    info!(
        app,
        account = %selected,
        strategy = %policy.selection_strategy,
        "selected target account"
    );
    Ok(selected)
}
