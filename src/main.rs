//! cnab-run: bundle action runtime.
//!
//! This is the main entry point for the `cnab-run` CLI. It parses arguments,
//! dispatches to the appropriate command handler, and handles errors with
//! proper exit codes.

mod cli;
mod commands;
pub mod bundle;
pub mod config;
pub mod console;
pub mod context;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod manifest;
pub mod mixin;
pub mod runtime;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the diagnostic log filter.
const ENV_LOG: &str = "CNAB_RUN_LOG";

fn main() -> ExitCode {
    // Diagnostics go to stderr so stdout carries only the action's own output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
