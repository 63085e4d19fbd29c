//! Build orchestrator: submits a build and drives its [`BuildJob`].

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use appfleet_platform::{BuildRequest, PlatformApi, PlatformError, Token};

use crate::controller::{BuildJob, BuildOutcome, PollAction};
use crate::strategy::PollConfig;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("build submission for {app} failed: {source}")]
    Submit {
        app: String,
        #[source]
        source: PlatformError,
    },

    #[error("polling build {build_id} failed: {source}")]
    Poll {
        build_id: String,
        #[source]
        source: PlatformError,
    },
}

impl BuildError {
    pub fn platform_error(&self) -> &PlatformError {
        match self {
            BuildError::Submit { source, .. } | BuildError::Poll { source, .. } => source,
        }
    }
}

pub type BuildResult<T> = Result<T, BuildError>;

/// Submits builds and waits for them within a fixed poll budget.
pub struct BuildOrchestrator {
    platform: Arc<dyn PlatformApi>,
    config: PollConfig,
}

impl BuildOrchestrator {
    pub fn new(platform: Arc<dyn PlatformApi>) -> Self {
        Self {
            platform,
            config: PollConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Build `artifact_url` on `app` and wait until the platform is done
    /// with it or the budget runs out.
    ///
    /// The terminal status comes back exactly as the platform reported it.
    /// A poll that fails at the transport level aborts the wait.
    pub async fn submit_and_await(
        &self,
        token: &Token,
        app: &str,
        artifact_url: &str,
    ) -> BuildResult<BuildOutcome> {
        let submitted = self
            .platform
            .create_build(token, app, &BuildRequest::from_url(artifact_url))
            .await
            .map_err(|source| BuildError::Submit {
                app: app.to_string(),
                source,
            })?;

        info!(app, build = %submitted.id, artifact = artifact_url, "build submitted");
        let mut job = BuildJob::new(&submitted.id, app, self.config.max_tries);

        loop {
            let build = self
                .platform
                .get_build(token, app, &job.id)
                .await
                .map_err(|source| BuildError::Poll {
                    build_id: job.id.clone(),
                    source,
                })?;

            match job.observe(&build.status) {
                PollAction::Wait => tokio::time::sleep(self.config.interval).await,
                PollAction::Stop => break,
            }
        }

        // Stop is only returned once the job is final.
        Ok(job.outcome().unwrap_or(BuildOutcome::TimedOut {
            build_id: job.id.clone(),
            attempts: job.attempts,
        }))
    }
}
