use std::path::PathBuf;

use clap::{Parser, Subcommand};

use appfleet_core::{MigrationStrategy, SelectionStrategy, SetConfigStrategy};

mod commands;

#[derive(Parser)]
#[command(
    name = "appfleet",
    about = "appfleet: deploy apps across a pool of platform accounts",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Settings file
    #[arg(short, long, global = true, default_value = "appfleet.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh all accounts and show their quota and apps
    Status {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Deploy an app configured under [apps.<name>].
    ///
    /// Policy flags override the [policy] section of the settings file.
    Deploy {
        app: String,
        /// preferred, best or manual
        #[arg(long)]
        selection: Option<SelectionStrategy>,
        /// external, internal or disabled
        #[arg(long)]
        migration: Option<MigrationStrategy>,
        /// remote, fallback or local
        #[arg(long)]
        set_config: Option<SetConfigStrategy>,
        /// Target account for manual selection
        #[arg(long)]
        deploy_to: Option<String>,
    },
    /// Delete an app from whichever account hosts it
    Delete { app: String },
    /// Manage app and local config
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List an app's builds
    Builds { app: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show an app's config vars
    Get { app: String },
    /// Set config vars on an app
    Set {
        app: String,
        /// KEY=VALUE pairs
        #[arg(required = true, value_parser = commands::config::parse_key_val)]
        vars: Vec<(String, String)>,
    },
    /// Store the local config in the remote config store
    Publish,
    /// Add an environment variable name to config_keys
    AddKey { key: String },
    /// List config_keys with their current environment values
    ListKeys,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("appfleet=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_path();

    match cli.command {
        Commands::Status { format } => commands::status::status(config, &format).await,
        Commands::Deploy {
            app,
            selection,
            migration,
            set_config,
            deploy_to,
        } => {
            let overrides = commands::deploy::PolicyFlags {
                selection,
                migration,
                set_config,
                deploy_to,
            };
            commands::deploy::deploy(config, &app, overrides).await
        }
        Commands::Delete { app } => commands::deploy::delete(config, &app).await,
        Commands::Config { action } => match action {
            ConfigAction::Get { app } => commands::config::get(config, &app).await,
            ConfigAction::Set { app, vars } => commands::config::set(config, &app, vars).await,
            ConfigAction::Publish => commands::config::publish(config).await,
            ConfigAction::AddKey { key } => commands::config::add_key(config, &key),
            ConfigAction::ListKeys => commands::config::list_keys(config),
        },
        Commands::Builds { app } => commands::builds::builds(config, &app).await,
    }
}
