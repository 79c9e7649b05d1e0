//! gridbroker CLI binary entrypoint.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use grid_cli::cli::{Cli, Commands};
use grid_cli::commands::verify::FarmSelection;
use grid_cli::commands::{CostCommand, PayoutCommand, VerifyCommand, WaitCommand};
use grid_cli::config::BrokerConfig;
use grid_cli::output::OutputFormat;
use grid_cli::snapshot::SnapshotBackend;
use grid_cli::CliError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<BrokerConfig, CliError> {
    let mut config = BrokerConfig::load_or_default(cli.config.as_deref())?;
    if let Some(url) = &cli.explorer_url {
        config = config.with_explorer_url(url.clone());
    }
    if let Commands::Wait {
        poll_interval_ms: Some(ms),
        ..
    } = cli.command
    {
        config = config.with_poll_interval_ms(ms);
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = resolve_config(&cli)?;
    let format = OutputFormat::new(cli.format);
    let backend = Arc::new(
        SnapshotBackend::open(&cli.snapshot)
            .await
            .map_err(|e| CliError::Snapshot(e.to_string()))?
            .with_default_currency(config.default_currency.clone()),
    );
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Cost { reservation_id } => {
            let cmd = CostCommand::new(backend);
            cmd.execute(&mut stdout, &format, reservation_id).await?;
        }
        Commands::Payout {
            reservation_id,
            dry_run,
        } => {
            let cmd = PayoutCommand::new(backend);
            cmd.execute(&mut stdout, &format, reservation_id, dry_run).await?;
        }
        Commands::VerifyPayment {
            reservation_id,
            farm,
            owner,
        } => {
            let selection = match owner.or(config.owner_id) {
                Some(owner) if farm.is_empty() => FarmSelection::Owner(owner),
                _ => FarmSelection::Farms(farm),
            };
            let cmd = VerifyCommand::new(backend);
            cmd.execute(&mut stdout, &format, reservation_id, &selection).await?;
        }
        Commands::Wait {
            reservation_id,
            mode,
            ..
        } => {
            let cmd = WaitCommand::new(backend, config.watch_config());
            cmd.execute(&mut stdout, &format, reservation_id, mode).await?;
        }
    }

    Ok(())
}
