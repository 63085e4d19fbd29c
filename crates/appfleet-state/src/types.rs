//! Domain types for accounts and the applications they host.

use appfleet_platform::{AppInfo, Token};
use serde::Serialize;

/// Stable key of an account, taken from its credential's env key.
pub type AccountName = String;

/// Platform-global application name.
pub type AppName = String;

// ── Account ───────────────────────────────────────────────────────

/// Outcome of the last refresh for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccountStatus {
    Ready,
    /// The last refresh could not reach this account.
    Unavailable { reason: String },
}

/// A platform account appfleet can deploy to.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub name: AccountName,
    pub env_key: String,
    #[serde(skip)]
    pub token: Token,
    /// Platform-assigned id, known once a refresh has reached the account.
    pub id: Option<String>,
    /// Seconds of compute time per billing interval.
    pub quota_total: i64,
    pub quota_used: i64,
    pub status: AccountStatus,
}

impl Account {
    /// May be negative; the platform does not cap usage at the quota.
    pub fn quota_remaining(&self) -> i64 {
        self.quota_total - self.quota_used
    }

    pub fn is_ready(&self) -> bool {
        self.status == AccountStatus::Ready
    }
}

// ── Application ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Application {
    pub id: String,
    pub name: AppName,
    pub stack: String,
    pub region: String,
    /// This app's share of its account's `quota_used`.
    pub quota_used: i64,
    /// Owning account, resolved by name through the directory.
    pub account: AccountName,
}

impl Application {
    pub fn from_info(info: AppInfo, account: &str) -> Self {
        Self {
            id: info.id,
            name: info.name,
            stack: info.stack.name,
            region: info.region.name,
            quota_used: 0,
            account: account.to_string(),
        }
    }
}
