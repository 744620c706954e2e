mod agents_cmd;
mod config;
mod env_client;
mod run_cmd;
mod terminal_output;
mod validate_cmd;
mod wiring;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use webrun_config::{config_dir, config_file_path};

use config::Overrides;

#[derive(Parser)]
#[command(name = "webrun")]
#[command(about = "Run LLM shopping agents against a web-shopping environment")]
#[command(version)]
struct Cli {
    /// Run config file (defaults to ~/.webrun/webrun.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured session range
    Run {
        #[command(flatten)]
        overrides: Overrides,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the selectable agents
    Agents,
    /// Print the effective (redacted) config and validate it
    ValidateConfig {
        #[command(flatten)]
        overrides: Overrides,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));

    match cli.command {
        Commands::Run { overrides, json } => run_cmd::run(&config_path, &overrides, json).await?,
        Commands::Agents => agents_cmd::run(),
        Commands::ValidateConfig { overrides } => {
            validate_cmd::run(&config_path, &overrides).await?
        }
    }

    Ok(())
}
