//! Buddy CLI and HTTP entry point.
//!
//! Binary name: `buddy`
//!
//! Loads configuration and provider credentials, wires the chat orchestrator,
//! then either serves the HTTP endpoint or opens the terminal chat.

mod cli;
mod http;
mod state;

use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use buddy_infra::config::load_config;
use buddy_infra::secret::ApiCredentials;
use buddy_observe::tracing_setup::{init_tracing, shutdown_tracing};
use buddy_types::config::BuddyConfig;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Terminal chat stays quiet by default so logs don't interleave with the prompt.
    let filter = match (&cli.command, cli.verbose) {
        (_, 0) if cli.quiet => "error",
        (Commands::Chat { .. }, 0) => "warn",
        (_, 0) => "info",
        (_, 1) => "debug",
        _ => "trace",
    };

    init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli.config).await;
    config.validate()?;

    // Fail before binding a port or opening the prompt.
    let credentials = ApiCredentials::from_env()?;
    let state = AppState::init(&config, credentials)?;

    let shutdown = CancellationToken::new();
    let sweeper = state.store().spawn_sweeper(
        Duration::from_secs(config.memory.sweep_interval_secs.max(1)),
        shutdown.clone(),
    );

    let outcome = match cli.command {
        Commands::Serve { host, port } => serve(state, &config, host, port).await,
        Commands::Chat { thread } => cli::chat::run_chat_loop(&state, thread).await,
    };

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!("Conversation sweeper ended abnormally: {e}");
    }

    outcome
}

async fn serve(
    state: AppState,
    config: &BuddyConfig,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, origins = config.server.allowed_origins.len(), "Buddy API listening");
    println!(
        "  {} Buddy API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state, &config.server.allowed_origins);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
