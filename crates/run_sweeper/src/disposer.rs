//! Decides what to do with each waiting run and dispatches the decision.

use std::fmt;

use tfe_client::{RunQueueClient, RunStatus};
use tracing::{debug, info, warn};

use crate::models::{Run, Workspace};

#[cfg(test)]
#[path = "disposer_tests.rs"]
mod tests;

/// What to do with a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Confirm the current run of an auto-apply workspace.
    Apply,
    /// Discard a cost-estimated run queued behind the current run.
    Discard,
    /// Cancel a pending run queued behind the current run.
    Cancel,
    /// Leave a pending current run alone; the service will start it.
    Skip,
    /// Nothing to do.
    NoAction,
}

impl Disposition {
    /// Decides the disposition of the run at `position` in a workspace queue.
    ///
    /// Position 0 is the workspace's current run; every later position is a
    /// run queued behind it.
    pub fn decide(position: usize, status: &RunStatus, auto_apply: bool) -> Self {
        match (position, status) {
            (0, RunStatus::CostEstimated) if auto_apply => Disposition::Apply,
            (0, RunStatus::Pending) => Disposition::Skip,
            (0, _) => Disposition::NoAction,
            (_, RunStatus::CostEstimated) => Disposition::Discard,
            (_, RunStatus::Pending) => Disposition::Cancel,
            (_, _) => Disposition::NoAction,
        }
    }

    /// Lower-cased name used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Apply => "apply",
            Disposition::Discard => "discard",
            Disposition::Cancel => "cancel",
            Disposition::Skip => "skip",
            Disposition::NoAction => "noaction",
        }
    }

    /// Comment attached to the service call, for dispositions that make one.
    pub fn comment(&self) -> Option<&'static str> {
        match self {
            Disposition::Apply => Some("Applying run automatically"),
            Disposition::Discard => Some("Discarding run automatically"),
            Disposition::Cancel => Some("Canceling run automatically"),
            Disposition::Skip | Disposition::NoAction => None,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened after a disposition was decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The service call succeeded.
    Dispatched,
    /// The service call failed with the given message.
    Failed(String),
    /// A call was due but `noop` suppressed it.
    Suppressed,
    /// The disposition does not call the service.
    NotRequired,
}

/// One decided run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposalRecord {
    pub run_id: String,
    pub workspace_name: String,
    pub disposition: Disposition,
    pub outcome: Outcome,
}

/// Every decision of a sweep, in the order it was made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisposalReport {
    pub records: Vec<DisposalRecord>,
}

impl DisposalReport {
    /// Number of successful service calls.
    pub fn dispatched_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Dispatched))
    }

    /// Number of failed service calls.
    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    /// Number of service calls skipped because of `noop`.
    pub fn suppressed_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Suppressed))
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

/// Decides and dispatches a disposition for every run of every workspace.
///
/// Workspaces are handled in order and, within a workspace, runs in queue
/// order, so the current run is always handled before the runs behind it.
/// A failed service call is logged and recorded; the sweep carries on with
/// the next run.
pub async fn dispose<C>(client: &C, workspaces: &[Workspace], noop: bool) -> DisposalReport
where
    C: RunQueueClient + ?Sized,
{
    let mut report = DisposalReport::default();

    for ws in workspaces {
        for (position, run) in ws.runs.iter().enumerate() {
            let disposition = Disposition::decide(position, &run.status, ws.auto_apply);
            let outcome = dispatch(client, ws, run, disposition, noop).await;

            report.records.push(DisposalRecord {
                run_id: run.id.clone(),
                workspace_name: ws.name.clone(),
                disposition,
                outcome,
            });
        }
    }

    report
}

async fn dispatch<C>(
    client: &C,
    ws: &Workspace,
    run: &Run,
    disposition: Disposition,
    noop: bool,
) -> Outcome
where
    C: RunQueueClient + ?Sized,
{
    if disposition == Disposition::NoAction {
        debug!(
            "run_id={},workspace_name={},action={}",
            run.id, ws.name, disposition
        );
        return Outcome::NotRequired;
    }

    info!(
        "run_id={},workspace_name={},action={}",
        run.id, ws.name, disposition
    );

    let Some(comment) = disposition.comment() else {
        return Outcome::NotRequired;
    };

    if noop {
        return Outcome::Suppressed;
    }

    let result = match disposition {
        Disposition::Apply => client.apply_run(&run.id, comment).await,
        Disposition::Discard => client.discard_run(&run.id, comment).await,
        Disposition::Cancel => client.cancel_run(&run.id, comment).await,
        Disposition::Skip | Disposition::NoAction => return Outcome::NotRequired,
    };

    match result {
        Ok(()) => Outcome::Dispatched,
        Err(err) => {
            warn!(
                run_id = run.id,
                workspace_name = ws.name,
                action = %disposition,
                error = %err,
                "Failed to dispatch run action, continuing"
            );
            Outcome::Failed(err.to_string())
        }
    }
}
