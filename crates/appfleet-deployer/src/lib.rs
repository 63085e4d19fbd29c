//! appfleet-deployer — deploys one application at a time across accounts.
//!
//! Ties the directory, placement and build crates together. The deployer:
//!
//! - Picks a target account per the deployment policy
//! - Moves an app off another account when the migration strategy allows
//! - Resolves config from the environment or the remote store
//! - Creates the app, applies config, and waits for its build
//!
//! # Architecture
//!
//! ```text
//! Deployer
//!   ├── AccountDirectory (refreshed before and after placement)
//!   ├── ConfigPropagator (local / remote / fallback)
//!   ├── MigrationController (external delete, conflict, not implemented)
//!   ├── BuildOrchestrator (submit, bounded polling)
//!   └── NameLocks (one operation per app name at a time)
//! ```

pub mod bootstrap;
pub mod config_sync;
pub mod coordinator;
pub mod error;
pub mod lock;
pub mod migration;

pub use config_sync::{ConfigPropagator, ConfigSource, ResolvedConfig};
pub use coordinator::{DeletedApp, DeployReport, Deployer};
pub use error::{DeployError, DeployResult, ErrorKind};
pub use lock::NameLocks;
pub use migration::{MigrationAction, MigrationController};
