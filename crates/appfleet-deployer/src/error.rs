//! Deployer error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use appfleet_placement::PlacementError;
use appfleet_platform::PlatformError;
use appfleet_rollout::BuildError;

/// Coarse failure category a front end can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidParams,
    Conflict,
    Unavailable,
    NotImplemented,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidParams => "invalid_params",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::NotImplemented => "not_implemented",
            ErrorKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while deploying or managing an application.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("no deployment config for app: {0}")]
    NoConfigForApp(String),

    #[error("no targz_url configured for app: {0}")]
    NoArtifactUrl(String),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("account unavailable: {0}")]
    AccountUnavailable(String),

    #[error("app not found: {0}")]
    AppNotFound(String),

    #[error("{app} lives on account {current}, target is {target}, and migration is disabled")]
    CrossAccountConflict {
        app: String,
        current: String,
        target: String,
    },

    #[error("internal migration of {app} from {current} to {target} is not implemented")]
    MigrationNotImplemented {
        app: String,
        current: String,
        target: String,
    },

    #[error("remote config unavailable: {0}")]
    ConfigUnavailable(String),

    #[error("app {app} not found on {account} after creation")]
    AppCreationFailed { app: String, account: String },

    #[error("build {build_id} of {app} still pending after {attempts} polls")]
    BuildTimeout {
        app: String,
        build_id: String,
        attempts: u32,
    },

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::NoConfigForApp(_)
            | DeployError::AccountNotFound(_)
            | DeployError::AppNotFound(_)
            | DeployError::AppCreationFailed { .. } => ErrorKind::NotFound,
            DeployError::NoArtifactUrl(_) => ErrorKind::InvalidParams,
            DeployError::Placement(e) => match e {
                PlacementError::MissingTarget => ErrorKind::InvalidParams,
                PlacementError::NoPreferredAccount(_) => ErrorKind::NotFound,
                PlacementError::NoAvailableAccount(_) => ErrorKind::Unavailable,
            },
            DeployError::AccountUnavailable(_) | DeployError::ConfigUnavailable(_) => {
                ErrorKind::Unavailable
            }
            DeployError::CrossAccountConflict { .. } => ErrorKind::Conflict,
            DeployError::MigrationNotImplemented { .. } => ErrorKind::NotImplemented,
            DeployError::BuildTimeout { .. } => ErrorKind::Timeout,
            DeployError::Platform(e) => platform_kind(e),
            DeployError::Build(e) => platform_kind(e.platform_error()),
        }
    }

    /// Stable identifier of the specific failure, for remediation hints.
    pub fn code(&self) -> &'static str {
        match self {
            DeployError::NoConfigForApp(_) => "no_config_for_app",
            DeployError::NoArtifactUrl(_) => "no_artifact_url",
            DeployError::Placement(PlacementError::MissingTarget) => "missing_target",
            DeployError::Placement(PlacementError::NoPreferredAccount(_)) => "no_preferred_account",
            DeployError::Placement(PlacementError::NoAvailableAccount(_)) => "no_available_account",
            DeployError::AccountNotFound(_) => "account_not_found",
            DeployError::AccountUnavailable(_) => "account_unavailable",
            DeployError::AppNotFound(_) => "app_not_found",
            DeployError::CrossAccountConflict { .. } => "cross_account_conflict",
            DeployError::MigrationNotImplemented { .. } => "migration_not_implemented",
            DeployError::ConfigUnavailable(_) => "config_unavailable",
            DeployError::AppCreationFailed { .. } => "app_creation_failed",
            DeployError::BuildTimeout { .. } => "build_timeout",
            DeployError::Platform(_) => "platform_error",
            DeployError::Build(_) => "build_failed",
        }
    }
}

fn platform_kind(err: &PlatformError) -> ErrorKind {
    match err {
        PlatformError::NotFound(_) => ErrorKind::NotFound,
        PlatformError::InvalidParams(_) => ErrorKind::InvalidParams,
        _ => ErrorKind::Unavailable,
    }
}

pub type DeployResult<T> = Result<T, DeployError>;
