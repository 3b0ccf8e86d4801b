//! LegacyChain CLI and REST API entry point.
//!
//! Binary name: `legacychain`
//!
//! Parses CLI arguments, loads configuration, wires the will service, then
//! dispatches to a command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use legacychain_infra::config::{load_app_config, resolve_data_dir};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    // Shell completions don't need configuration or state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "legacychain", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    let config = load_app_config(&data_dir).await;

    if let Commands::Config = &cli.command {
        return cli::config::show_config(&data_dir, &config, cli.json);
    }

    let state = AppState::init(data_dir, &config).await?;

    match cli.command {
        Commands::Show { owner } => {
            cli::will::show_will(&state, &owner, cli.json).await?;
        }

        Commands::Execute { owner } => {
            cli::will::execute_will(&state, &owner, cli.json).await?;
        }

        Commands::History { owner, limit } => {
            cli::history::show_history(&state, owner.as_deref(), limit, cli.json).await?;
        }

        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} LegacyChain API listening on {} ({})",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan(),
                config.ledger.network
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());
            tracing::info!(addr = %addr, data_dir = %state.data_dir.display(), "serving");

            let shutdown = state.shutdown.clone();
            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal(shutdown))
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Config | Commands::Completions { .. } => {}
    }

    Ok(())
}

/// `RUST_LOG` wins over the verbosity flags when set.
fn init_tracing(cli: &Cli) {
    let default_filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,legacychain_core=debug,legacychain_infra=debug,legacychain_api=debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

/// Wait for Ctrl+C or SIGTERM, then cancel every running countdown.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
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
                tracing::error!("failed to install SIGTERM handler: {e}");
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

    tracing::info!("shutdown requested");
    shutdown.cancel();
}
