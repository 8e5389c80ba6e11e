//! Gantry CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success (approved, or no ready work)
//! - 1: Gate failure or iteration ceiling exceeded
//! - 2: Missing credentials
//! - 3: Aborted (stage error, rejected path, configuration)

use std::process::ExitCode;

use clap::Parser;
use gantry_core::CoreError;
use gantry_llm::LlmError;
use gantry_tracker::TrackerError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod settings;

use commands::{Cli, Commands, GateFailed};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GATE_FAILURE: u8 = 1;
    pub const MISSING_CREDENTIALS: u8 = 2;
    pub const ABORTED: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "gantry=debug,warn"
    } else if cli.quiet {
        "warn"
    } else {
        "gantry=info,warn"
    };

    // Logging may already be initialized by an embedding process
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .try_init();

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::Gate(args) => commands::gate::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<GateFailed>().is_some() {
        return ExitCodes::GATE_FAILURE;
    }
    if matches!(
        e.downcast_ref::<CoreError>(),
        Some(CoreError::IterationCeilingExceeded { .. })
    ) {
        return ExitCodes::GATE_FAILURE;
    }
    if matches!(e.downcast_ref::<LlmError>(), Some(LlmError::LlmNotConfigured))
        || matches!(
            e.downcast_ref::<TrackerError>(),
            Some(TrackerError::NotConfigured(_))
        )
    {
        return ExitCodes::MISSING_CREDENTIALS;
    }
    ExitCodes::ABORTED
}
