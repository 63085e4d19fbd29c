//! Account credential discovery.
//!
//! One account per environment entry whose key starts with the token prefix
//! (`HEROKU_TOKEN_ALICE=...` → account `ALICE`).

use std::fmt;

use tracing::{debug, warn};

/// Bearer token for one platform account. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// A discovered account credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Account name taken from the env key.
    pub account: String,
    /// Full env key the token was read from.
    pub env_key: String,
    pub token: Token,
}

impl Credential {
    pub fn new(account: &str, token: &str) -> Self {
        Self {
            account: account.to_string(),
            env_key: account.to_string(),
            token: Token::new(token),
        }
    }
}

/// Extract the account name from an env key, if it carries the prefix.
///
/// The name is the segment after the prefix up to the next `_`.
pub fn account_name(key: &str, prefix: &str) -> Option<String> {
    let rest = key.strip_prefix(prefix)?;
    let name = rest.split('_').next().unwrap_or_default();
    (!name.is_empty()).then(|| name.to_string())
}

/// Discover credentials from an environment listing, sorted by account name.
pub fn discover_credentials<I>(vars: I, prefix: &str) -> Vec<Credential>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut found: Vec<Credential> = Vec::new();
    let mut vars: Vec<(String, String)> = vars.into_iter().collect();
    vars.sort();

    for (key, value) in vars {
        let Some(account) = account_name(&key, prefix) else {
            continue;
        };
        if value.is_empty() {
            warn!(env_key = %key, "empty account token, skipping");
            continue;
        }
        if found.iter().any(|c| c.account == account) {
            warn!(env_key = %key, %account, "duplicate account name, keeping the first token");
            continue;
        }
        debug!(%account, env_key = %key, "discovered account credential");
        found.push(Credential {
            account,
            env_key: key,
            token: Token::new(value),
        });
    }

    found.sort_by(|a, b| a.account.cmp(&b.account));
    found
}
