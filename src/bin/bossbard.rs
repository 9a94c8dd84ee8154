//! `bossbard` - serves boss bars to clients over a Unix socket.
//!
//! ```bash
//! bossbard start                                   # default socket
//! bossbard --config ./bossbard.toml start --socket /run/bossbar.sock
//! bossbard check-config                            # print effective TOML
//! RUST_LOG=bossbard=debug bossbard start
//! ```
//!
//! SIGINT or SIGTERM stops accepting clients, detaches every session and
//! unlinks the socket.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bossbard::bars::spawn_bar_service;
use bossbard::config::DaemonConfig;
use bossbard::server::DaemonServer;

/// Bossbar daemon - server-side boss bar synchronization
#[derive(Parser, Debug)]
#[command(name = "bossbard", version, about)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the daemon
    Start {
        /// Socket path (overrides config and BOSSBAR_SOCKET)
        #[arg(short, long)]
        socket: Option<PathBuf>,
    },
    /// Validate the configuration and print it
    CheckConfig,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = DaemonConfig::load(args.config.as_deref()).context("Failed to load config")?;
    config.apply_env();

    match args.command.unwrap_or(Command::Start { socket: None }) {
        Command::Start { socket } => {
            if let Some(socket) = socket {
                config.socket_path = socket;
            }
            run_daemon(config)
        }
        Command::CheckConfig => {
            config.validate().context("Invalid config")?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// Starts the bar service and serves clients until a signal arrives.
#[tokio::main]
async fn run_daemon(config: DaemonConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("bossbard=info".parse()?)
                .add_directive("bossbar_core=info".parse()?)
                .add_directive("bossbar_protocol=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "Bossbar daemon starting"
    );

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Signal handler failed, stopping");
        }
        shutdown_token.cancel();
    });

    let bars = spawn_bar_service(&config.welcome);
    info!(welcome = config.welcome.enabled, "Bar service started");

    let server = DaemonServer::from_config(&config, bars, cancel_token);
    info!(socket = %config.socket_path.display(), "Starting server");

    if let Err(e) = server.run().await {
        error!(error = %e, "Bar client server failed");
        return Err(e.into());
    }

    info!("Bossbar daemon stopped");
    Ok(())
}

/// Resolves on SIGTERM or SIGINT (Ctrl+C elsewhere).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM, shutting down");
            }
            _ = sigint.recv() => {
                info!("SIGINT, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Ctrl+C, shutting down");
    }

    Ok(())
}
