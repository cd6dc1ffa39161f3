//! Collection of the runs waiting in a workspace queue.
//!
//! The service lists runs most recent first. In a stalled workspace the runs
//! still waiting (cost-estimated or pending) sit at the head of that listing;
//! older, settled runs (applied, discarded, errored, ...) follow them.

use tfe_client::{RunListOptions, RunQueueClient, RunStatus};
use tracing::{debug, error};

use crate::errors::{ScanError, ScanFailure};
use crate::models::Run;

#[cfg(test)]
#[path = "run_queue_tests.rs"]
mod tests;

/// How far back through a workspace's run history to page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueueScanStrategy {
    /// Stop after the first page whose last run is not pending.
    ///
    /// Assumes the waiting runs of a queue are contiguous at the head of the
    /// listing. If the service ever interleaved settled and pending runs, the
    /// pending runs beyond the first settled page tail would be missed.
    #[default]
    StopAtSettledRun,

    /// Page through every run the service reports.
    FullQueue,
}

/// Returns true for statuses the sweeper acts on.
pub fn is_waiting(status: &RunStatus) -> bool {
    matches!(status, RunStatus::CostEstimated | RunStatus::Pending)
}

/// Lists the cost-estimated and pending runs of a workspace, in service order.
///
/// With [`QueueScanStrategy::StopAtSettledRun`] the next page is requested
/// only while the last run of the current page (filtered or not) is pending
/// and the service reports a page beyond the one requested.
///
/// # Errors
///
/// Returns a [`ScanFailure`] carrying the runs collected so far when a page
/// cannot be fetched. No further pages are requested after a failure.
pub async fn list_waiting_runs<C>(
    client: &C,
    workspace_id: &str,
    strategy: QueueScanStrategy,
) -> Result<Vec<Run>, ScanFailure<Run>>
where
    C: RunQueueClient + ?Sized,
{
    let mut runs = Vec::new();
    let mut page_number = 1u32;

    loop {
        debug!(
            workspace_id = workspace_id,
            page = page_number,
            "Fetching page {} of runs",
            page_number
        );

        let options = RunListOptions { page_number };
        let page = match client.list_runs(workspace_id, &options).await {
            Ok(page) => page,
            Err(err) => {
                error!(
                    workspace_id = workspace_id,
                    page = page_number,
                    error = %err,
                    "Failed to list runs"
                );
                return Err(ScanFailure::new(
                    runs,
                    ScanError::ListRuns {
                        workspace_id: workspace_id.to_string(),
                        page: page_number,
                        source: err,
                    },
                ));
            }
        };

        let tail_is_pending = page
            .items
            .last()
            .is_some_and(|run| run.status == RunStatus::Pending);
        let next_page = page.next_page().filter(|next| *next > page_number);

        runs.extend(
            page.items
                .into_iter()
                .filter(|run| is_waiting(&run.status))
                .map(Run::from),
        );

        let next_page = match (strategy, next_page) {
            (QueueScanStrategy::StopAtSettledRun, Some(next)) if tail_is_pending => Some(next),
            (QueueScanStrategy::FullQueue, Some(next)) => Some(next),
            _ => None,
        };

        match next_page {
            Some(next) => page_number = next,
            None => break,
        }
    }

    debug!(
        workspace_id = workspace_id,
        waiting_runs = runs.len(),
        last_page = page_number,
        "Collected waiting runs"
    );

    Ok(runs)
}
