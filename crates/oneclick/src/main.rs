use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

mod commands;

use commands::{ConnectionArgs, VariableArgs};

#[derive(Parser)]
#[command(name = "oneclick")]
#[command(about = "Deploy one-click app templates to a Captain platform")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to oneclick.log in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a template
    Validate {
        /// Template file (YAML or JSON)
        template: PathBuf,
    },

    /// Show the services and steps a deployment would run
    Plan {
        /// Template file (YAML or JSON)
        template: PathBuf,

        #[command(flatten)]
        vars: VariableArgs,
    },

    /// Deploy a template
    Deploy {
        /// Template file (YAML or JSON)
        template: PathBuf,

        #[command(flatten)]
        vars: VariableArgs,

        #[command(flatten)]
        connection: ConnectionArgs,

        /// Run against an in-memory platform instead
        #[arg(long)]
        dry_run: bool,
    },
}

fn init_logging(verbose: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::never(dir, "oneclick.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false); // No ANSI colors in log file
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_dir.as_deref())?;

    match &cli.command {
        Commands::Validate { template } => commands::validate::run(template).await,
        Commands::Plan { template, vars } => commands::plan::run(template, vars).await,
        Commands::Deploy {
            template,
            vars,
            connection,
            dry_run,
        } => commands::deploy::run(template, vars, connection, *dry_run).await,
    }
}
