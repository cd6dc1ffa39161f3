//! Terraform Cloud run queue sweeper.
//!
//! Finds the workspaces of an organization whose current run is stuck waiting
//! for confirmation after its cost estimate, then applies that run when the
//! workspace is set to auto-apply and clears the runs queued behind it. It is
//! meant to be run periodically, e.g. from a scheduled CI job.

use tfe_client::{RunQueueClient, RunStatus};
use tracing::info;

pub mod config;
pub mod disposer;
pub mod errors;
pub mod models;
pub mod run_queue;
pub mod scanner;

pub use config::{CliArgs, SweepConfig};
pub use disposer::{dispose, DisposalRecord, DisposalReport, Disposition, Outcome};
pub use errors::{ConfigError, ScanError, ScanFailure};
pub use models::{Run, Workspace};
pub use run_queue::{list_waiting_runs, QueueScanStrategy};
pub use scanner::list_workspaces_with_run_status;

/// Environment variable holding the log filter directives.
pub const LOG_ENV_VAR: &str = "TFE_SWEEPER_LOG";

#[cfg(test)]
#[path = "test_support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Runs a sweep with a client and configuration.
pub struct RunSweeper<C> {
    client: C,
    config: SweepConfig,
}

impl<C: RunQueueClient> RunSweeper<C> {
    /// Create a new sweeper.
    ///
    /// # Arguments
    ///
    /// * `client` - Authenticated service client
    /// * `config` - Sweep settings
    pub fn new(client: C, config: SweepConfig) -> Self {
        Self { client, config }
    }

    /// Returns the client the sweeper talks to.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Scans the organization for workspaces stalled on a cost-estimated run
    /// and disposes of their run queues.
    ///
    /// Nothing is disposed unless the whole scan succeeds.
    ///
    /// # Errors
    ///
    /// Returns the [`ScanFailure`] of the scan, with the workspaces collected
    /// before the failing request.
    pub async fn sweep(&self) -> Result<DisposalReport, ScanFailure<Workspace>> {
        if self.config.noop {
            info!("noop=true,message=no action will be taken");
        }

        let workspaces = list_workspaces_with_run_status(
            &self.client,
            &self.config.organization,
            self.config.search.as_deref(),
            &RunStatus::CostEstimated,
            self.config.queue_scan,
        )
        .await?;

        let report = dispose(&self.client, &workspaces, self.config.noop).await;

        info!(
            org = self.config.organization,
            workspaces = workspaces.len(),
            decisions = report.records.len(),
            dispatched = report.dispatched_count(),
            failed = report.failed_count(),
            suppressed = report.suppressed_count(),
            "Sweep completed"
        );

        Ok(report)
    }
}

/// Initialize logging for the sweeper.
///
/// Log lines go to standard error. Filter directives are read from
/// `TFE_SWEEPER_LOG` and default to `info`.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
