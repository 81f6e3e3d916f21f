//! # amb CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, and
//! dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use amb_cli::deploy::{run_deploy, run_deployment, DeployArgs, DeploymentArgs};
use amb_cli::run::{run_bridge, RunArgs};
use amb_cli::status::{run_status, StatusArgs};

/// Approval-mint bridge operator CLI.
///
/// Writes deployment records, runs a local bridge (approval registry,
/// mint gate, relayer, HTTP API), and inspects relayer state.
#[derive(Parser, Debug)]
#[command(name = "amb", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate approver keys and write a deployment record.
    Deploy(DeployArgs),

    /// Inspect deployment records.
    Deployment(DeploymentArgs),

    /// Run a local bridge with relayer and HTTP API.
    Run(RunArgs),

    /// Print the relayer's persisted state.
    Status(StatusArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // `RUST_LOG` wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }

    let result = match &cli.command {
        Commands::Deploy(args) => run_deploy(args),
        Commands::Deployment(args) => run_deployment(args),
        Commands::Run(args) => run_bridge(args),
        Commands::Status(args) => run_status(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
