//! Supportdesk REST API entry point.
//!
//! Binary name: `supportdesk`
//!
//! Parses CLI arguments, loads configuration, installs tracing, then
//! dispatches to the command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use std::net::SocketAddr;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands, ConfigCommand};
use state::AppState;
use supportdesk_infra::config::{load_from_env, warn_on_weak_settings};
use supportdesk_observe::tracing_setup::{init_tracing, shutdown_tracing};
use supportdesk_types::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need configuration
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "supportdesk", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = load_from_env().await?;

    init_tracing(
        config.logging.format,
        config.logging.otel_stdout,
        cli.log_filter(),
    )
    .map_err(|e| anyhow::anyhow!(e))?;
    warn_on_weak_settings(&config);

    match cli.command {
        Commands::Config {
            action: ConfigCommand::Show,
        } => cli::config::show(&config, cli.json)?,

        Commands::Status => cli::config::status(&config, cli.json).await?,

        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            serve(config, cli.quiet).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    shutdown_tracing();
    Ok(())
}

async fn serve(config: AppConfig, quiet: bool) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let environment = config.environment;
    let state = AppState::init(config).await?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, %environment, "Server listening");
    if !quiet {
        println!(
            "  {} Supportdesk API listening on {}",
            console::style("⚡").bold(),
            console::style(format!("http://{addr}")).cyan()
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }

    let pruner = state
        .limiters
        .clone()
        .spawn_pruner(http::middleware::rate_limit::PRUNE_INTERVAL);
    let router = http::router::build_router(state);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    pruner.abort();

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
