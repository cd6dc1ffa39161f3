//! Discovery of workspaces whose current run is stuck in a given status.

use tfe_client::{RunQueueClient, RunStatus, WorkspaceListOptions};
use tracing::{debug, error, info};

use crate::errors::{ScanError, ScanFailure};
use crate::models::Workspace;
use crate::run_queue::{list_waiting_runs, QueueScanStrategy};

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;

/// Lists the workspaces of `organization` whose current run has
/// `target_status`, each with its queue of waiting runs.
///
/// Workspaces are paged through with their current run inlined and filtered
/// by `search` (no filter when `None` or empty). Pagination ends when the
/// service reports no page beyond the one requested.
///
/// # Arguments
///
/// * `client` - Service client
/// * `organization` - Organization to scan
/// * `search` - Optional workspace name search term
/// * `target_status` - Current run status that marks a workspace as stalled
/// * `strategy` - How far to page through each workspace's runs
///
/// # Errors
///
/// Returns a [`ScanFailure`] carrying the workspaces collected so far as soon
/// as any workspace or run page fails to load.
pub async fn list_workspaces_with_run_status<C>(
    client: &C,
    organization: &str,
    search: Option<&str>,
    target_status: &RunStatus,
    strategy: QueueScanStrategy,
) -> Result<Vec<Workspace>, ScanFailure<Workspace>>
where
    C: RunQueueClient + ?Sized,
{
    info!(
        org = organization,
        search = search.unwrap_or_default(),
        status = %target_status,
        "Searching for workspaces with stalled runs"
    );

    let mut workspaces = Vec::new();
    let mut page_number = 1u32;

    loop {
        debug!(
            org = organization,
            page = page_number,
            "Fetching page {} of workspaces",
            page_number
        );

        let options = WorkspaceListOptions {
            page_number,
            search: search.map(str::to_string),
            include_current_run: true,
        };

        let page = match client.list_workspaces(organization, &options).await {
            Ok(page) => page,
            Err(err) => {
                error!(
                    org = organization,
                    page = page_number,
                    error = %err,
                    "Failed to list workspaces"
                );
                return Err(ScanFailure::new(
                    workspaces,
                    ScanError::ListWorkspaces {
                        organization: organization.to_string(),
                        page: page_number,
                        source: err,
                    },
                ));
            }
        };

        let next_page = page.next_page().filter(|next| *next > page_number);

        for ws in page.items {
            let Some(current_run) = ws.current_run.as_ref() else {
                debug!(workspace_name = ws.name, "Workspace has no current run, skipping");
                continue;
            };

            if current_run.status != *target_status {
                debug!(
                    workspace_name = ws.name,
                    run_id = current_run.id,
                    status = %current_run.status,
                    "Current run is not stalled, skipping"
                );
                continue;
            }

            info!(
                workspace_name = ws.name,
                run_id = current_run.id,
                "Found workspace with stalled current run"
            );

            let runs = match list_waiting_runs(client, &ws.id, strategy).await {
                Ok(runs) => runs,
                Err(failure) => {
                    return Err(ScanFailure::new(workspaces, failure.error));
                }
            };

            workspaces.push(Workspace {
                id: ws.id,
                name: ws.name,
                auto_apply: ws.auto_apply,
                runs,
            });
        }

        match next_page {
            Some(next) => page_number = next,
            None => break,
        }
    }

    info!(
        org = organization,
        stalled_count = workspaces.len(),
        "Workspace scan completed"
    );

    Ok(workspaces)
}
