//! Candidate ranking for the `best` selection strategy.
//!
//! Evaluates candidate accounts on:
//! - **Availability**: the last refresh reached the account
//! - **App ceiling**: the account hosts fewer than [`MAX_APPS_PER_ACCOUNT`] apps
//! - **Allow-list**: the account is allowed for this application
//!
//! Survivors are ordered by descending remaining quota.

/// Most applications a single account may host before `best` skips it.
pub const MAX_APPS_PER_ACCOUNT: usize = 5;

/// Quota and app count for a single account.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AccountCapacity {
    pub account: String,
    pub quota_total: i64,
    pub quota_used: i64,
    pub app_count: usize,
    /// False when the last refresh could not reach the account.
    pub available: bool,
}

impl AccountCapacity {
    /// Negative when the account is over quota.
    pub fn quota_remaining(&self) -> i64 {
        self.quota_total - self.quota_used
    }

    pub fn has_room(&self) -> bool {
        self.app_count < MAX_APPS_PER_ACCOUNT
    }
}

/// Filter and rank accounts, best first.
///
/// `allowed` of `None` allows every account. Ties on remaining quota keep
/// the input order.
pub fn rank_candidates<'a>(
    accounts: &'a [AccountCapacity],
    allowed: Option<&[String]>,
) -> Vec<&'a AccountCapacity> {
    let mut candidates: Vec<&AccountCapacity> = accounts
        .iter()
        .filter(|a| a.available && a.has_room())
        .filter(|a| allowed.is_none_or(|names| names.iter().any(|n| *n == a.account)))
        .collect();

    // sort_by_key is stable.
    candidates.sort_by_key(|a| std::cmp::Reverse(a.quota_remaining()));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_account(name: &str, total: i64, used: i64, apps: usize) -> AccountCapacity {
        AccountCapacity {
            account: name.to_string(),
            quota_total: total,
            quota_used: used,
            app_count: apps,
            available: true,
        }
    }

    fn names(ranked: &[&AccountCapacity]) -> Vec<String> {
        ranked.iter().map(|a| a.account.clone()).collect()
    }

    #[test]
    fn orders_by_remaining_quota() {
        let accounts = vec![
            make_account("A", 1000, 900, 0), // 100 left.
            make_account("B", 1000, 100, 0), // 900 left.
            make_account("C", 1000, 500, 0), // 500 left.
        ];
        assert_eq!(names(&rank_candidates(&accounts, None)), ["B", "C", "A"]);
    }

    #[test]
    fn negative_remaining_sorts_last() {
        let accounts = vec![
            make_account("over", 500, 800, 0),
            make_account("way-over", 500, 2000, 0),
            make_account("under", 500, 0, 0),
        ];
        let ranked = rank_candidates(&accounts, None);
        assert_eq!(ranked[0].quota_remaining(), 500);
        assert_eq!(names(&ranked), ["under", "over", "way-over"]);
    }

    #[test]
    fn ties_keep_account_order() {
        let accounts = vec![
            make_account("A", 1000, 0, 0),
            make_account("B", 1000, 0, 3),
            make_account("C", 1000, 0, 1),
        ];
        for _ in 0..10 {
            assert_eq!(names(&rank_candidates(&accounts, None)), ["A", "B", "C"]);
        }
    }

    #[test]
    fn full_accounts_are_skipped() {
        let accounts = vec![
            make_account("full", 9999, 0, MAX_APPS_PER_ACCOUNT),
            make_account("room", 10, 0, MAX_APPS_PER_ACCOUNT - 1),
        ];
        assert_eq!(names(&rank_candidates(&accounts, None)), ["room"]);
    }

    #[test]
    fn unavailable_accounts_are_skipped() {
        let mut down = make_account("down", 9999, 0, 0);
        down.available = false;
        let accounts = vec![down, make_account("up", 1, 0, 0)];
        assert_eq!(names(&rank_candidates(&accounts, None)), ["up"]);
    }

    #[test]
    fn allow_list_restricts_candidates() {
        let accounts = vec![
            make_account("A", 1000, 0, 0),
            make_account("B", 500, 0, 0),
            make_account("C", 100, 0, 0),
        ];
        let allowed = vec!["C".to_string(), "B".to_string()];
        assert_eq!(names(&rank_candidates(&accounts, Some(&allowed))), ["B", "C"]);
        assert!(rank_candidates(&accounts, Some(&[])).is_empty());
    }
}
