//! # Models
//!
//! Data models returned by the Terraform Cloud client.
//!
//! These are flattened views of the JSON:API resources the service returns:
//! only the attributes needed to find and unblock stalled run queues are kept.

use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Status of a Terraform Cloud run.
///
/// Statuses the client does not know about are preserved in [`RunStatus::Other`]
/// so that new service states never break deserialization.
///
/// # Examples
///
/// ```
/// use tfe_client::models::RunStatus;
///
/// let status = RunStatus::from("cost_estimated");
/// assert_eq!(status, RunStatus::CostEstimated);
/// assert_eq!(status.as_str(), "cost_estimated");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Pending,
    Fetching,
    FetchingCompleted,
    PrePlanRunning,
    PrePlanCompleted,
    Queuing,
    PlanQueued,
    Planning,
    Planned,
    CostEstimating,
    CostEstimated,
    PolicyChecking,
    PolicyOverride,
    PolicySoftFailed,
    PolicyChecked,
    Confirmed,
    PostPlanRunning,
    PostPlanCompleted,
    PlannedAndFinished,
    PlannedAndSaved,
    ApplyQueued,
    Applying,
    Applied,
    Discarded,
    Errored,
    Canceled,
    ForceCanceled,
    /// A status string this client does not recognise.
    Other(String),
}

impl RunStatus {
    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Fetching => "fetching",
            RunStatus::FetchingCompleted => "fetching_completed",
            RunStatus::PrePlanRunning => "pre_plan_running",
            RunStatus::PrePlanCompleted => "pre_plan_completed",
            RunStatus::Queuing => "queuing",
            RunStatus::PlanQueued => "plan_queued",
            RunStatus::Planning => "planning",
            RunStatus::Planned => "planned",
            RunStatus::CostEstimating => "cost_estimating",
            RunStatus::CostEstimated => "cost_estimated",
            RunStatus::PolicyChecking => "policy_checking",
            RunStatus::PolicyOverride => "policy_override",
            RunStatus::PolicySoftFailed => "policy_soft_failed",
            RunStatus::PolicyChecked => "policy_checked",
            RunStatus::Confirmed => "confirmed",
            RunStatus::PostPlanRunning => "post_plan_running",
            RunStatus::PostPlanCompleted => "post_plan_completed",
            RunStatus::PlannedAndFinished => "planned_and_finished",
            RunStatus::PlannedAndSaved => "planned_and_saved",
            RunStatus::ApplyQueued => "apply_queued",
            RunStatus::Applying => "applying",
            RunStatus::Applied => "applied",
            RunStatus::Discarded => "discarded",
            RunStatus::Errored => "errored",
            RunStatus::Canceled => "canceled",
            RunStatus::ForceCanceled => "force_canceled",
            RunStatus::Other(value) => value,
        }
    }
}

impl From<&str> for RunStatus {
    fn from(value: &str) -> Self {
        match value {
            "pending" => RunStatus::Pending,
            "fetching" => RunStatus::Fetching,
            "fetching_completed" => RunStatus::FetchingCompleted,
            "pre_plan_running" => RunStatus::PrePlanRunning,
            "pre_plan_completed" => RunStatus::PrePlanCompleted,
            "queuing" => RunStatus::Queuing,
            "plan_queued" => RunStatus::PlanQueued,
            "planning" => RunStatus::Planning,
            "planned" => RunStatus::Planned,
            "cost_estimating" => RunStatus::CostEstimating,
            "cost_estimated" => RunStatus::CostEstimated,
            "policy_checking" => RunStatus::PolicyChecking,
            "policy_override" => RunStatus::PolicyOverride,
            "policy_soft_failed" => RunStatus::PolicySoftFailed,
            "policy_checked" => RunStatus::PolicyChecked,
            "confirmed" => RunStatus::Confirmed,
            "post_plan_running" => RunStatus::PostPlanRunning,
            "post_plan_completed" => RunStatus::PostPlanCompleted,
            "planned_and_finished" => RunStatus::PlannedAndFinished,
            "planned_and_saved" => RunStatus::PlannedAndSaved,
            "apply_queued" => RunStatus::ApplyQueued,
            "applying" => RunStatus::Applying,
            "applied" => RunStatus::Applied,
            "discarded" => RunStatus::Discarded,
            "errored" => RunStatus::Errored,
            "canceled" => RunStatus::Canceled,
            "force_canceled" => RunStatus::ForceCanceled,
            other => RunStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for RunStatus {
    fn from(value: String) -> Self {
        RunStatus::from(value.as_str())
    }
}

impl From<RunStatus> for String {
    fn from(value: RunStatus) -> Self {
        match value {
            RunStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current run of a workspace, as inlined by `include=current_run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRun {
    /// The run ID (e.g. `run-CZcmD7eagjhyX0vN`)
    pub id: String,
    /// The run status
    pub status: RunStatus,
}

/// A workspace as returned by the workspace list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRecord {
    /// The workspace ID (e.g. `ws-SihZTyXKfNXUWuUa`)
    pub id: String,
    /// The workspace name
    pub name: String,
    /// Whether successful plans are applied without confirmation
    pub auto_apply: bool,
    /// The workspace's current run, when the service reported one and it
    /// was present in the included resources
    pub current_run: Option<CurrentRun>,
}

/// A run as returned by the workspace run list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    /// The run ID
    pub id: String,
    /// The run status
    pub status: RunStatus,
}

/// Pagination metadata of a list response.
///
/// Pages are numbered from 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Pagination {
    /// The page this response holds
    #[serde(default)]
    pub current_page: u32,
    /// The following page, if any
    pub next_page: Option<u32>,
    /// The preceding page, if any
    pub prev_page: Option<u32>,
    /// Total number of pages
    #[serde(default)]
    pub total_pages: u32,
    /// Total number of items across all pages
    #[serde(default)]
    pub total_count: u32,
}

impl Pagination {
    /// Pagination for a response that fits on a single page.
    pub fn single(page_number: u32, item_count: usize) -> Self {
        Self {
            current_page: page_number,
            next_page: None,
            prev_page: None,
            total_pages: 1,
            total_count: u32::try_from(item_count).unwrap_or(u32::MAX),
        }
    }

    /// Returns the page to request next.
    ///
    /// A next-page indicator that does not move forward is treated as the
    /// end of the listing, so callers following it can never loop.
    pub fn next_page(&self) -> Option<u32> {
        self.next_page.filter(|next| *next > self.current_page)
    }
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page, in the order the service returned them
    pub items: Vec<T>,
    /// Pagination metadata
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Creates a page from its items and pagination metadata.
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self { items, pagination }
    }

    /// Returns the page to request next, if the service reported one.
    pub fn next_page(&self) -> Option<u32> {
        self.pagination.next_page()
    }
}
