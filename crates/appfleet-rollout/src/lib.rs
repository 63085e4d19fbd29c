//! appfleet builds — submit a source tarball, poll until the platform is done.
//!
//! The platform owns the build; this crate only watches it. A build is
//! finished when its status is anything but `pending`, and the watch gives
//! up after a fixed number of polls.
//!
//! # Components
//!
//! - **`strategy`**: Poll budget (tries, interval)
//! - **`controller`**: BuildJob state machine (submitted, polling, terminal, timed out)
//! - **`orchestrator`**: Drives a BuildJob against the platform

pub mod controller;
pub mod orchestrator;
pub mod strategy;

pub use controller::{BuildJob, BuildOutcome, BuildPhase, PollAction};
pub use orchestrator::{BuildError, BuildOrchestrator, BuildResult};
pub use strategy::{BUILD_POLL_INTERVAL, BUILD_POLL_TRIES, PollConfig};
