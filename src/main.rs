//! Beacon server
//!
//! Runs the webhook relay, or writes a starter config file.

use anyhow::Context;
use beacon::config::{generate_default_config, Config, LoggingConfig};
use beacon::{serve, AppState};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "beacon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CloudEvents webhook relay to realtime hub clients")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relay server (default)
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write a default config file
    InitConfig {
        /// Output path
        #[arg(default_value = "config.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::InitConfig { path, force }) => init_config(&path, force),
        Some(Commands::Serve { host, port }) => run(cli.config, host, port).await,
        None => run(cli.config, None, None).await,
    }
}

async fn run(config_path: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    // the configured subscriber needs the config, so loading logs go to a
    // scoped bootstrap subscriber
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beacon=info".into()),
        )
        .finish();
    let loaded = tracing::subscriber::with_default(bootstrap, || match &config_path {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Config::load_default().context("loading config"),
    });
    let mut config = loaded?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    init_tracing(&config.logging);
    config.validate()?;

    tracing::info!("Starting Beacon v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        mode = %config.broadcast.mode,
        channel = %config.relay.channel_name,
        "Relaying CloudEvents"
    );

    let server = config.server.clone();
    let state = AppState::from_config(config)?;
    serve(state, &server).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("beacon={},tower_http=info", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn init_config(path: &PathBuf, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    std::fs::write(path, generate_default_config())
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
