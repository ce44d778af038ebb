//! CLI argument parsing for cnab-run.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};

/// cnab-run: executes a bundle action inside its invocation image.
///
/// Each step of the action is handed to its mixin in declared order. Values
/// the mixins produce are bound to the bundle's declared outputs.
#[derive(Parser, Debug)]
#[command(name = "cnab-run")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for cnab-run.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute an action.
    ///
    /// Validates the manifest, runs every step of the action through its
    /// mixin and collects bundle outputs.
    Run(RunArgs),

    /// Validate the manifest for an action without running it.
    ///
    /// Reports the steps that would run and the outputs in scope.
    Check(CheckArgs),
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Action to execute (default: $CNAB_ACTION).
    #[arg(short, long)]
    pub action: Option<String>,

    /// Path to the manifest (default: <root>/app/porter.yaml).
    #[arg(short, long)]
    pub manifest: Option<String>,

    /// Path to the runtime config file (default: $CNAB_RUN_CONFIG).
    #[arg(short, long)]
    pub config: Option<String>,

    /// Root of the bundle filesystem layout, overriding the config.
    #[arg(long)]
    pub root: Option<String>,
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
