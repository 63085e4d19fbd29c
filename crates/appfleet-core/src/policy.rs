//! Deployment policy: how a target account is chosen, how an app living
//! elsewhere is moved, and where its configuration comes from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do with an app that already exists on an account other than the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStrategy {
    /// Delete the app from its current account, then recreate it on the target.
    #[default]
    External,
    /// Platform-native move. Not available.
    Internal,
    /// Refuse to deploy across accounts.
    Disabled,
}

/// How the target account is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// The app's configured preferred account.
    #[default]
    Preferred,
    /// The allowed account with the most quota left.
    Best,
    /// The policy's explicit `deploy_to`.
    Manual,
}

/// Where the configuration applied to a deployed app comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetConfigStrategy {
    Remote,
    /// Remote when it has content, local otherwise.
    #[default]
    Fallback,
    Local,
}

/// Policy for a single deployment request. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentPolicy {
    pub migration_strategy: MigrationStrategy,
    pub selection_strategy: SelectionStrategy,
    pub set_config_strategy: SetConfigStrategy,
    /// Explicit target account, used by [`SelectionStrategy::Manual`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_to: Option<String>,
}

impl DeploymentPolicy {
    /// The manual target, treating an empty string as absent.
    pub fn target(&self) -> Option<&str> {
        self.deploy_to.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} strategy: {value}")]
pub struct ParsePolicyError {
    kind: &'static str,
    value: String,
}

macro_rules! strategy_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParsePolicyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(ParsePolicyError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

strategy_names!(MigrationStrategy, "migration", {
    External => "external",
    Internal => "internal",
    Disabled => "disabled",
});

strategy_names!(SelectionStrategy, "selection", {
    Preferred => "preferred",
    Best => "best",
    Manual => "manual",
});

strategy_names!(SetConfigStrategy, "set-config", {
    Remote => "remote",
    Fallback => "fallback",
    Local => "local",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let policy = DeploymentPolicy::default();
        assert_eq!(policy.migration_strategy, MigrationStrategy::External);
        assert_eq!(policy.selection_strategy, SelectionStrategy::Preferred);
        assert_eq!(policy.set_config_strategy, SetConfigStrategy::Fallback);
        assert!(policy.target().is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let policy: DeploymentPolicy =
            serde_json::from_str(r#"{"selection_strategy":"manual","deploy_to":"A"}"#).unwrap();
        assert_eq!(policy.selection_strategy, SelectionStrategy::Manual);
        assert_eq!(policy.migration_strategy, MigrationStrategy::External);
        assert_eq!(policy.target(), Some("A"));
    }

    #[test]
    fn empty_deploy_to_is_no_target() {
        let policy = DeploymentPolicy {
            deploy_to: Some(String::new()),
            ..Default::default()
        };
        assert!(policy.target().is_none());
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("Best".parse::<SelectionStrategy>().unwrap(), SelectionStrategy::Best);
        assert_eq!("disabled".parse::<MigrationStrategy>().unwrap(), MigrationStrategy::Disabled);
        assert_eq!(" local ".parse::<SetConfigStrategy>().unwrap(), SetConfigStrategy::Local);

        let err = "sideways".parse::<MigrationStrategy>().unwrap_err();
        assert_eq!(err.to_string(), "unknown migration strategy: sideways");
    }
}
