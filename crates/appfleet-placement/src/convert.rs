//! Capacities from a directory snapshot.

use appfleet_state::DirectorySnapshot;

use crate::scorer::AccountCapacity;

/// One [`AccountCapacity`] per snapshot account, in directory order.
pub fn capacities(snapshot: &DirectorySnapshot) -> Vec<AccountCapacity> {
    snapshot
        .accounts()
        .iter()
        .map(|account| AccountCapacity {
            account: account.name.clone(),
            quota_total: account.quota_total,
            quota_used: account.quota_used,
            app_count: snapshot.app_count(&account.name),
            available: account.is_ready(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use appfleet_platform::Token;
    use appfleet_state::{Account, AccountStatus, Application};

    fn account(name: &str, status: AccountStatus) -> Account {
        Account {
            name: name.to_string(),
            env_key: format!("HEROKU_TOKEN_{name}"),
            token: Token::new("t"),
            id: None,
            quota_total: 1000,
            quota_used: 250,
            status,
        }
    }

    fn app(name: &str, account: &str) -> Application {
        Application {
            id: format!("id-{name}"),
            name: name.to_string(),
            stack: "heroku-22".to_string(),
            region: "us".to_string(),
            quota_used: 0,
            account: account.to_string(),
        }
    }

    #[test]
    fn counts_apps_and_availability() {
        let snapshot = DirectorySnapshot::new(
            vec![
                account("A", AccountStatus::Ready),
                account(
                    "B",
                    AccountStatus::Unavailable {
                        reason: "timeout".to_string(),
                    },
                ),
            ],
            vec![app("one", "A"), app("two", "A")],
        );

        let caps = capacities(&snapshot);
        assert_eq!(caps.len(), 2);
        assert_eq!(caps[0].account, "A");
        assert_eq!(caps[0].app_count, 2);
        assert_eq!(caps[0].quota_remaining(), 750);
        assert!(caps[0].available);
        assert_eq!(caps[1].app_count, 0);
        assert!(!caps[1].available);
    }
}
