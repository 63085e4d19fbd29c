//! Directory snapshot and the cross-account application registry.

use serde::Serialize;

use crate::types::{Account, AccountStatus, Application};

/// One refresh's worth of accounts and applications.
///
/// Account order is the credential discovery order; application order
/// within an account is the order the platform listed them in.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DirectorySnapshot {
    accounts: Vec<Account>,
    applications: Vec<Application>,
}

impl DirectorySnapshot {
    pub fn new(accounts: Vec<Account>, applications: Vec<Application>) -> Self {
        Self {
            accounts,
            applications,
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.name == name)
    }

    /// Applications owned by `account`, in platform order.
    pub fn apps_of<'a>(&'a self, account: &'a str) -> impl Iterator<Item = &'a Application> + 'a {
        self.applications.iter().filter(move |a| a.account == account)
    }

    pub fn app_count(&self, account: &str) -> usize {
        self.apps_of(account).count()
    }

    pub fn registry(&self) -> Registry<'_> {
        Registry { snapshot: self }
    }

    /// Accounts with their applications nested, for display.
    pub fn view(&self) -> Vec<AccountView<'_>> {
        self.accounts
            .iter()
            .map(|account| AccountView {
                name: &account.name,
                id: account.id.as_deref(),
                quota_total: account.quota_total,
                quota_used: account.quota_used,
                quota_remaining: account.quota_remaining(),
                status: &account.status,
                apps: self.apps_of(&account.name).collect(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct AccountView<'a> {
    pub name: &'a str,
    pub id: Option<&'a str>,
    pub quota_total: i64,
    pub quota_used: i64,
    pub quota_remaining: i64,
    pub status: &'a AccountStatus,
    pub apps: Vec<&'a Application>,
}

/// Read-only name lookups over a [`DirectorySnapshot`].
///
/// Only applications whose owning account resolves are visible.
#[derive(Debug, Clone, Copy)]
pub struct Registry<'a> {
    snapshot: &'a DirectorySnapshot,
}

impl<'a> Registry<'a> {
    /// All applications, in account order then per-account order.
    pub fn list_all(&self) -> Vec<&'a Application> {
        let snapshot = self.snapshot;
        snapshot
            .accounts
            .iter()
            .flat_map(|account| snapshot.apps_of(&account.name))
            .collect()
    }

    /// First application named `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&'a Application> {
        self.list_all().into_iter().find(|a| a.name == name)
    }

    /// The account currently hosting the application named `name`.
    pub fn find_owning_account(&self, name: &str) -> Option<&'a Account> {
        let snapshot = self.snapshot;
        let app = self.find_by_name(name)?;
        snapshot.account(&app.account)
    }
}
