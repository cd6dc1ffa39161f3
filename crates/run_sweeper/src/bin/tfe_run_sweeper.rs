//! Unblock Terraform Cloud workspaces stuck behind cost-estimated runs.
//!
//! Usage:
//!   tfe-run-sweeper --org <ORG> [--search <TERM>] [--noop]
//!
//! Environment variables:
//! - TFE_TOKEN: API token (required)
//! - TFE_ADDRESS: Service address (default: https://app.terraform.io)
//! - TFE_SWEEPER_LOG: Log filter directives (default: info)

use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use run_sweeper::{CliArgs, ConfigError, RunSweeper, SweepConfig};
use tfe_client::TfeClient;
use tracing::error;

async fn run(config: SweepConfig) -> anyhow::Result<()> {
    let client = TfeClient::new(&config.address, &config.token)
        .context("Failed to create Terraform Cloud client")?
        .with_page_size(config.page_size);

    let sweeper = RunSweeper::new(client, config);
    sweeper
        .sweep()
        .await
        .context("Failed to scan workspaces for stalled runs")?;

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config = match SweepConfig::from_env(args) {
        Ok(config) => config,
        Err(ConfigError::MissingOrganization) => {
            eprintln!("{}", CliArgs::command().render_help());
            process::exit(1);
        }
        Err(ConfigError::MissingToken) => {
            println!("{}", ConfigError::MissingToken);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    run_sweeper::init_logging();

    if let Err(e) = run(config).await {
        error!("Error: {e:#}");
        process::exit(1);
    }
}
