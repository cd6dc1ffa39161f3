//! Error types for the run sweeper.

use std::fmt::Debug;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised while assembling the sweep configuration.
///
/// These are reported to the user before any request is sent to the service.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The `--org` argument was not given or was empty.
    #[error("Terraform Cloud organization name not provided")]
    MissingOrganization,

    /// The `TFE_TOKEN` environment variable is unset or empty.
    #[error("Environment variable TFE_TOKEN not found")]
    MissingToken,

    /// The `TFE_ADDRESS` environment variable is not a valid URL.
    #[error("Invalid Terraform Cloud address '{address}': {reason}")]
    InvalidAddress {
        /// The rejected value
        address: String,
        /// Why it was rejected
        reason: String,
    },
}

/// A listing request that failed while scanning workspaces or run queues.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Listing a page of the organization's workspaces failed.
    #[error("Failed to list workspaces of organization '{organization}' (page {page})")]
    ListWorkspaces {
        /// Organization being scanned
        organization: String,
        /// Page that failed
        page: u32,
        /// Underlying client error
        #[source]
        source: tfe_client::Error,
    },

    /// Listing a page of a workspace's runs failed.
    #[error("Failed to list runs of workspace '{workspace_id}' (page {page})")]
    ListRuns {
        /// Workspace being scanned
        workspace_id: String,
        /// Page that failed
        page: u32,
        /// Underlying client error
        #[source]
        source: tfe_client::Error,
    },
}

/// A scan aborted by a [`ScanError`].
///
/// Carries whatever had been collected before the failure so callers can
/// inspect it. The sweeper itself never disposes of a partial scan.
#[derive(Error, Debug)]
#[error("Scan aborted after collecting {} item(s)", .partial.len())]
pub struct ScanFailure<T: Debug> {
    /// Items collected before the failing request
    pub partial: Vec<T>,
    /// The failing request
    #[source]
    pub error: ScanError,
}

impl<T: Debug> ScanFailure<T> {
    pub(crate) fn new(partial: Vec<T>, error: ScanError) -> Self {
        Self { partial, error }
    }
}
