//! Paydown CLI and reminder daemon entry point.
//!
//! Binary name: `paydown`
//!
//! Parses CLI arguments, initializes logging, the database and the ledger
//! service, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use paydown_infra::filesystem::{resolve_data_dir, write_default_config};
use paydown_observe::{LogOptions, init_tracing, shutdown_tracing, verbosity_filter};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_options = LogOptions {
        filter: verbosity_filter(cli.verbose, cli.quiet).to_string(),
        json: cli.log_json,
        enable_otel: std::env::var_os("PAYDOWN_OTEL").is_some(),
    };
    init_tracing(&log_options).map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let result = dispatch(cli).await;
    shutdown_tracing();
    result
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "paydown", &mut std::io::stdout());
        return Ok(());
    }

    // The config has to exist before state loads it
    let wrote_config = match cli.command {
        Commands::Init => write_default_config(&resolve_data_dir()).await?,
        _ => false,
    };

    let state = AppState::init(cli.date).await?;

    match cli.command {
        Commands::Init => cli::loan::init(&state, wrote_config, cli.json).await?,
        Commands::Today => cli::day::today(&state, cli.json).await?,
        Commands::Save { amount } => cli::day::save(&state, &amount, cli.json).await?,
        Commands::Status => cli::day::status(&state, cli.json).await?,
        Commands::Plan => cli::loan::plan(&state, cli.json).await?,
        Commands::AddLoan {
            name,
            amount,
            due_day,
            months,
            start,
            kind,
            must_start,
        } => {
            cli::loan::add_loan(
                &state,
                name,
                amount,
                due_day,
                months,
                start,
                kind.into(),
                must_start,
                cli.json,
            )
            .await?
        }
        Commands::CloseLoan { id } => cli::loan::close_loan(&state, &id, cli.json).await?,
        Commands::Roll => cli::day::roll(&state, cli.json).await?,
        Commands::Run { once } => cli::run::run(&state, once, cli.json).await?,
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    state.db_pool.close().await;
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
