//! Periodic account directory refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use appfleet_deployer::Deployer;

/// Refresh every `interval` until `shutdown` flips.
pub async fn run(deployer: Arc<Deployer>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    info!(interval_secs = interval.as_secs(), "directory refresher started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let report = deployer.refresh().await;
                if report.unavailable.is_empty() {
                    debug!(accounts = report.accounts, applications = report.applications, "periodic refresh");
                } else {
                    warn!(unavailable = ?report.unavailable, "periodic refresh could not reach some accounts");
                }
            }
            _ = shutdown.changed() => {
                info!("directory refresher shutting down");
                break;
            }
        }
    }
}
