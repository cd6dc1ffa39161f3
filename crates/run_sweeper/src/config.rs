//! Command line and environment configuration for a sweep.
//!
//! Everything a sweep needs is read once at startup into a [`SweepConfig`]
//! which is then passed down explicitly.

use std::env;

use clap::Parser;
use secrecy::SecretString;
use tfe_client::{DEFAULT_ADDRESS, DEFAULT_PAGE_SIZE};
use url::Url;

use crate::errors::ConfigError;
use crate::run_queue::QueueScanStrategy;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Environment variable holding the API token.
pub const TOKEN_ENV_VAR: &str = "TFE_TOKEN";

/// Environment variable overriding the service address.
pub const ADDRESS_ENV_VAR: &str = "TFE_ADDRESS";

/// tfe-run-sweeper: unblock Terraform Cloud workspaces stuck behind
/// cost-estimated runs
#[derive(Debug, Parser)]
#[command(name = "tfe-run-sweeper")]
#[command(
    version,
    about = "Apply, discard or cancel Terraform Cloud runs stuck behind a cost estimate",
    long_about = None
)]
pub struct CliArgs {
    /// Terraform Cloud organization name
    #[arg(long)]
    pub org: Option<String>,

    /// Workspace search term
    #[arg(long, default_value = "")]
    pub search: String,

    /// Do not perform any action, only show what would happen
    #[arg(long)]
    pub noop: bool,

    /// Page through every run of a workspace instead of stopping at the
    /// first page that ends with a settled run
    #[arg(long)]
    pub full_queue_scan: bool,

    /// Number of items requested per page
    #[arg(
        long,
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    pub page_size: u32,
}

/// Settings for one sweep.
#[derive(Debug)]
pub struct SweepConfig {
    /// Organization to scan
    pub organization: String,
    /// Workspace name search term, `None` for no filter
    pub search: Option<String>,
    /// Log decisions without calling the service
    pub noop: bool,
    /// How far to page through each workspace's runs
    pub queue_scan: QueueScanStrategy,
    /// Items requested per page
    pub page_size: u32,
    /// Service address
    pub address: Url,
    /// API token
    pub token: SecretString,
}

impl SweepConfig {
    /// Builds the configuration from parsed arguments and the process
    /// environment (`TFE_TOKEN`, `TFE_ADDRESS`).
    ///
    /// # Errors
    ///
    /// See [`SweepConfig::from_parts`].
    pub fn from_env(args: CliArgs) -> Result<Self, ConfigError> {
        Self::from_parts(args, env_value(TOKEN_ENV_VAR), env_value(ADDRESS_ENV_VAR))
    }

    /// Builds the configuration from parsed arguments and explicit token and
    /// address values.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - `ConfigError::MissingOrganization` if no non-empty organization was given
    /// - `ConfigError::MissingToken` if the token is absent or empty
    /// - `ConfigError::InvalidAddress` if the address is not an http(s) URL
    pub fn from_parts(
        args: CliArgs,
        token: Option<String>,
        address: Option<String>,
    ) -> Result<Self, ConfigError> {
        let organization = args
            .org
            .filter(|org| !org.trim().is_empty())
            .ok_or(ConfigError::MissingOrganization)?;

        let token = token
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
            .ok_or(ConfigError::MissingToken)?;

        let address = parse_address(address.as_deref().unwrap_or(DEFAULT_ADDRESS))?;

        let search = Some(args.search).filter(|s| !s.is_empty());

        let queue_scan = if args.full_queue_scan {
            QueueScanStrategy::FullQueue
        } else {
            QueueScanStrategy::StopAtSettledRun
        };

        Ok(Self {
            organization,
            search,
            noop: args.noop,
            queue_scan,
            page_size: args.page_size,
            address,
            token,
        })
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse_address(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidAddress {
        address: value.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidAddress {
            address: value.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(url)
}
