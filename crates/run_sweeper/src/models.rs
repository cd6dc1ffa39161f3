//! Snapshot of the workspaces and run queues a sweep acts on.

use tfe_client::{RunRecord, RunStatus};

/// A run waiting in a workspace queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// The run ID
    pub id: String,
    /// The run status, either cost-estimated or pending once collected
    pub status: RunStatus,
}

impl From<RunRecord> for Run {
    fn from(value: RunRecord) -> Self {
        Self {
            id: value.id,
            status: value.status,
        }
    }
}

/// A workspace whose current run is stalled, together with its run queue.
///
/// `runs[0]` is the workspace's current run; later entries are runs queued
/// behind it, most recent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// The workspace ID
    pub id: String,
    /// The workspace name
    pub name: String,
    /// Whether the workspace applies successful plans without confirmation
    pub auto_apply: bool,
    /// Outstanding runs in service order
    pub runs: Vec<Run>,
}
