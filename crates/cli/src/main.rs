//! frontsmith CLI: the main entry point.
//!
//! Commands:
//! - `agent`   Work on a front-end project interactively or with one requirement
//! - `check`   Test-run the project and report whether it starts
//! - `onboard` Write a starter config file
//! - `doctor`  Diagnose configuration and environment

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "frontsmith",
    about = "frontsmith: a conversational agent for front-end projects",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.frontsmith/config.toml
    #[arg(short, long, global = true, env = "FRONTSMITH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Work on a project with the agent
    Agent {
        /// Project root (asked for when omitted)
        path: Option<PathBuf>,

        /// Handle a single requirement instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Apply proposed changes without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Check whether the project can run
    Check {
        /// Project root (defaults to the current directory)
        path: Option<PathBuf>,
    },

    /// Write a starter configuration
    Onboard,

    /// Diagnose configuration and environment
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Agent { path, message, yes } => {
            commands::agent::run(config_path, path, message, yes).await?
        }
        Commands::Check { path } => commands::check::run(config_path, path).await?,
        Commands::Onboard => commands::onboard::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
