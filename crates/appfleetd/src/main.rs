//! appfleetd: the appfleet daemon.
//!
//! Loads `appfleet.toml`, wires the deployer against the platform, refreshes
//! the account directory, and serves the admin API until Ctrl-C.
//!
//! # Usage
//!
//! ```text
//! ADMIN_PASS=secret HEROKU_TOKEN_main=... appfleetd serve --config appfleet.toml
//! ```

mod refresher;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

use appfleet_api::{ApiState, build_router};
use appfleet_core::FleetConfig;
use appfleet_deployer::Deployer;

#[derive(Parser)]
#[command(name = "appfleetd", about = "appfleet daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the admin API.
    Serve {
        /// Settings file. Defaults apply when it does not exist.
        #[arg(long, short, default_value = "appfleet.toml")]
        config: PathBuf,

        /// Port to listen on. Overrides the settings file and PORT.
        #[arg(long)]
        port: Option<u16>,

        /// Seconds between background directory refreshes. 0 disables.
        #[arg(long, default_value = "0")]
        refresh_interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,appfleetd=debug,appfleet=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            refresh_interval,
        } => serve(&config, port, refresh_interval).await,
    }
}

fn load_settings(path: &Path) -> anyhow::Result<FleetConfig> {
    let mut settings = if path.exists() {
        let settings = FleetConfig::from_file(path)?;
        info!(path = %path.display(), apps = settings.apps.len(), "settings loaded");
        settings
    } else {
        warn!(path = %path.display(), "settings file not found, using defaults");
        FleetConfig::default()
    };
    settings.apply_env_overrides(std::env::vars());
    Ok(settings)
}

async fn serve(config: &Path, port: Option<u16>, refresh_interval: u64) -> anyhow::Result<()> {
    let settings = load_settings(config)?;
    let port = port.unwrap_or(settings.server.port);
    info!(app_name = %settings.server.app_name, "appfleet daemon starting");

    // ── Deployer ───────────────────────────────────────────────

    let deployer = Arc::new(Deployer::from_settings(&settings, std::env::vars())?);

    let report = deployer.refresh().await;
    info!(
        accounts = report.accounts,
        applications = report.applications,
        unavailable = report.unavailable.len(),
        "initial refresh done"
    );

    // ── Background refresh ─────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_handle = (refresh_interval > 0).then(|| {
        let deployer = deployer.clone();
        tokio::spawn(refresher::run(
            deployer,
            Duration::from_secs(refresh_interval),
            shutdown_rx,
        ))
    });

    // ── API server ─────────────────────────────────────────────

    let admin_pass = std::env::var("ADMIN_PASS").ok();
    if admin_pass.as_deref().is_none_or(str::is_empty) {
        warn!("ADMIN_PASS is not set, admin requests will be refused");
    }
    let state = ApiState::new(deployer, admin_pass, settings.server.app_name.clone())
        .with_default_policy(settings.policy.clone());
    let router = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Some(handle) = refresh_handle {
        let _ = handle.await;
    }

    info!("appfleet daemon stopped");
    Ok(())
}
