//! Build job: the polling state machine for one build.
//!
//! `Submitted → Polling → {Terminal | TimedOut}`. The job only counts; the
//! orchestrator does the waiting and the network calls.

use serde::Serialize;
use tracing::{debug, info, warn};

use appfleet_platform::BUILD_PENDING;

/// Current phase of a build job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum BuildPhase {
    /// Accepted by the platform, not polled yet.
    Submitted,
    /// Polled at least once, still pending.
    Polling,
    /// The platform reported a status other than `pending`.
    Terminal { status: String },
    /// The poll budget ran out while the build was still pending.
    TimedOut,
}

/// What the orchestrator does after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    /// Wait one interval and poll again.
    Wait,
    /// Stop polling; the phase is final.
    Stop,
}

/// How a watched build ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BuildOutcome {
    /// The platform reported this status. Success and failure both land here.
    Finished { build_id: String, status: String },
    /// We stopped waiting; the platform never said the build was done.
    TimedOut { build_id: String, attempts: u32 },
}

impl BuildOutcome {
    pub fn build_id(&self) -> &str {
        match self {
            BuildOutcome::Finished { build_id, .. } | BuildOutcome::TimedOut { build_id, .. } => {
                build_id
            }
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, BuildOutcome::TimedOut { .. })
    }
}

/// A build being watched. Lives only as long as one deployment's build phase.
#[derive(Debug, Clone)]
pub struct BuildJob {
    pub id: String,
    pub app: String,
    pub phase: BuildPhase,
    pub tries_left: u32,
    pub attempts: u32,
}

impl BuildJob {
    pub fn new(id: &str, app: &str, max_tries: u32) -> Self {
        Self {
            id: id.to_string(),
            app: app.to_string(),
            phase: BuildPhase::Submitted,
            tries_left: max_tries,
            attempts: 0,
        }
    }

    /// Record one polled status and decide what happens next.
    pub fn observe(&mut self, status: &str) -> PollAction {
        if self.is_final() {
            return PollAction::Stop;
        }
        self.attempts += 1;

        if status != BUILD_PENDING {
            info!(
                app = %self.app,
                build = %self.id,
                status,
                attempts = self.attempts,
                "build reached terminal status"
            );
            self.phase = BuildPhase::Terminal {
                status: status.to_string(),
            };
            return PollAction::Stop;
        }

        self.tries_left = self.tries_left.saturating_sub(1);
        if self.tries_left == 0 {
            warn!(
                app = %self.app,
                build = %self.id,
                attempts = self.attempts,
                "build still pending, giving up"
            );
            self.phase = BuildPhase::TimedOut;
            return PollAction::Stop;
        }

        debug!(
            app = %self.app,
            build = %self.id,
            tries_left = self.tries_left,
            "build pending"
        );
        self.phase = BuildPhase::Polling;
        PollAction::Wait
    }

    pub fn is_final(&self) -> bool {
        matches!(self.phase, BuildPhase::Terminal { .. } | BuildPhase::TimedOut)
    }

    /// The outcome, once the job is final.
    pub fn outcome(&self) -> Option<BuildOutcome> {
        match &self.phase {
            BuildPhase::Terminal { status } => Some(BuildOutcome::Finished {
                build_id: self.id.clone(),
                status: status.clone(),
            }),
            BuildPhase::TimedOut => Some(BuildOutcome::TimedOut {
                build_id: self.id.clone(),
                attempts: self.attempts,
            }),
            BuildPhase::Submitted | BuildPhase::Polling => None,
        }
    }
}
