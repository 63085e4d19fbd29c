//! appfleet-core — settings and policy types shared by every appfleet crate.
//!
//! - **`config`**: The `appfleet.toml` settings file and its env overrides
//! - **`policy`**: Deployment policy strategies and their defaults

pub mod config;
pub mod policy;

pub use config::{
    AppDeploymentConfig, ConfigError, FleetConfig, PlatformConfig, RemoteConfigSettings,
    ServerConfig,
};
pub use policy::{
    DeploymentPolicy, MigrationStrategy, ParsePolicyError, SelectionStrategy, SetConfigStrategy,
};
