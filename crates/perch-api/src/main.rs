//! Perch CLI entry point.
//!
//! Binary name: `perch`
//!
//! Parses CLI arguments, sets up tracing, loads the config, then dispatches
//! to the command handler.

mod cli;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use perch_infra::config::{load_config, resolve_config_path};
use perch_observe::tracing_setup::{init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or tracing
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "perch", &mut std::io::stdout());
        return Ok(());
    }

    let filter = cli::log_filter(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run { events, otel } => {
            let path = resolve_config_path(cli.config.as_deref());
            let config = load_config(&path).await?;
            init_tracing(filter, otel || config.otel)
                .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

            let result = cli::run::run(config, events, cli.json, cli.quiet).await;
            shutdown_tracing();
            result?;
        }

        Commands::Validate => {
            init_tracing(filter, false).map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;
            let path = resolve_config_path(cli.config.as_deref());
            cli::validate::validate(&path, cli.json).await?;
        }

        Commands::Resolve {
            username,
            limit,
            message,
        } => {
            init_tracing(filter, false).map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;
            cli::resolve::resolve(&username, limit, message.as_deref(), cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
pub(crate) async fn shutdown_signal() {
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
