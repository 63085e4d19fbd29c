pub mod builds;
pub mod config;
pub mod deploy;
pub mod status;

use std::path::Path;

use anyhow::Context;
use tracing::debug;

use appfleet_core::FleetConfig;
use appfleet_deployer::Deployer;

/// Load the settings file, or defaults when it does not exist.
pub fn load_settings(path: &Path) -> anyhow::Result<FleetConfig> {
    let mut settings = if path.is_file() {
        FleetConfig::from_file(path).with_context(|| format!("reading {}", path.display()))?
    } else {
        debug!(path = %path.display(), "no settings file, using defaults");
        FleetConfig::default()
    };
    settings.apply_env_overrides(std::env::vars());
    Ok(settings)
}

pub fn deployer(settings: &FleetConfig) -> anyhow::Result<Deployer> {
    Ok(Deployer::from_settings(settings, std::env::vars())?)
}
