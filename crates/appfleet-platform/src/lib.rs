//! appfleet-platform — everything appfleet knows about the hosting platform.
//!
//! The platform itself is an external service. This crate holds its contract
//! and the pieces that talk to it:
//!
//! - **`api`**: The [`PlatformApi`] trait (accounts, apps, config vars, builds)
//! - **`client`**: [`HttpPlatform`], the REST implementation over reqwest
//! - **`remote_config`**: The keyed remote configuration store
//! - **`credentials`**: Per-account bearer tokens discovered from the environment
//! - **`memory`**: In-process fakes of both services that record every call
//!
//! Platform responses that carry `"id": "not_found"` or `"id": "invalid_params"`
//! are failures even when the HTTP status says otherwise; they surface as
//! [`PlatformError::NotFound`] and [`PlatformError::InvalidParams`].

pub mod api;
pub mod client;
pub mod credentials;
pub mod error;
pub mod memory;
pub mod remote_config;
pub mod types;

pub use api::PlatformApi;
pub use client::HttpPlatform;
pub use credentials::{Credential, Token, discover_credentials};
pub use error::{PlatformError, PlatformResult};
pub use memory::{MemoryConfigStore, MemoryPlatform, PlatformCall};
pub use remote_config::{HttpConfigStore, RemoteConfigStore};
pub use types::*;
