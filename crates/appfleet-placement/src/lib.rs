//! appfleet placement — which account should host an application.
//!
//! This crate only decides. It never talks to the platform; it works on the
//! capacities derived from a directory snapshot and hands back an account
//! name for the deployer to act on.
//!
//! # Components
//!
//! - **`scorer`**: Candidate filtering and ranking for the `best` strategy
//! - **`placer`**: Account selection per selection strategy
//! - **`convert`**: Capacities from a directory snapshot

pub mod convert;
pub mod placer;
pub mod scorer;

pub use convert::capacities;
pub use placer::{PlacementError, PlacementResult, select_account};
pub use scorer::{AccountCapacity, MAX_APPS_PER_ACCOUNT, rank_candidates};
