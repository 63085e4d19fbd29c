//! appfleet-state — the account directory and the application registry.
//!
//! The directory owns what appfleet knows about every platform account: its
//! quota snapshot and the applications it hosts. It is rebuilt wholesale by
//! [`AccountDirectory::refresh`] and handed out as an immutable
//! [`DirectorySnapshot`] behind an `Arc`, so readers never see a
//! half-refreshed directory.
//!
//! # Architecture
//!
//! ```text
//! AccountDirectory
//!   ├── PlatformApi (one fan-out task per account on refresh)
//!   ├── CredentialSource (env prefix or a fixed list)
//!   └── RwLock<Arc<DirectorySnapshot>>
//!         ├── accounts: Vec<Account>          (keyed by name)
//!         └── applications: Vec<Application>  (owning account by name)
//! ```
//!
//! Applications reference their account by name rather than by pointer;
//! an application whose account does not resolve is an orphan and the
//! [`Registry`] never returns it.

pub mod directory;
pub mod registry;
pub mod types;

pub use directory::{AccountDirectory, CredentialSource, RefreshReport};
pub use registry::{AccountView, DirectorySnapshot, Registry};
pub use types::*;
