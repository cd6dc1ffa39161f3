//! Scripted `RunQueueClient` shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tfe_client::{
    CurrentRun, Error as TfeError, Page, Pagination, RunListOptions, RunQueueClient, RunRecord,
    RunStatus, WorkspaceListOptions, WorkspaceRecord,
};

/// A request received by the mock client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ListWorkspaces {
        organization: String,
        search: Option<String>,
        page: u32,
    },
    ListRuns {
        workspace_id: String,
        page: u32,
    },
    Apply {
        run_id: String,
        comment: String,
    },
    Discard {
        run_id: String,
        comment: String,
    },
    Cancel {
        run_id: String,
        comment: String,
    },
}

/// Mock client serving pre-built pages and recording every call.
///
/// Page `n` of a listing is the `n`-th page added for it. Requests for pages
/// that were never added answer `NotFound`.
#[derive(Default)]
pub(crate) struct MockRunQueueClient {
    workspace_pages: Vec<Page<WorkspaceRecord>>,
    failing_workspace_page: Option<u32>,
    run_pages: HashMap<String, Vec<Page<RunRecord>>>,
    failing_run_pages: HashMap<String, u32>,
    failing_runs: HashSet<String>,
    ignores_page_number: bool,
    calls: Mutex<Vec<Call>>,
}

impl MockRunQueueClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds the next workspace page. `has_next` marks a further page.
    pub(crate) fn with_workspace_page(
        mut self,
        items: Vec<WorkspaceRecord>,
        has_next: bool,
    ) -> Self {
        let page_number = self.workspace_pages.len() as u32 + 1;
        self.workspace_pages
            .push(Page::new(items, pagination(page_number, has_next)));
        self
    }

    /// Adds the next run page of a workspace.
    pub(crate) fn with_run_page(
        mut self,
        workspace_id: &str,
        items: Vec<RunRecord>,
        has_next: bool,
    ) -> Self {
        let pages = self.run_pages.entry(workspace_id.to_string()).or_default();
        let page_number = pages.len() as u32 + 1;
        pages.push(Page::new(items, pagination(page_number, has_next)));
        self
    }

    /// Makes a workspace page answer with a server error.
    pub(crate) fn failing_workspace_page(mut self, page: u32) -> Self {
        self.failing_workspace_page = Some(page);
        self
    }

    /// Makes a run page of a workspace answer with a server error.
    pub(crate) fn failing_run_page(mut self, workspace_id: &str, page: u32) -> Self {
        self.failing_run_pages.insert(workspace_id.to_string(), page);
        self
    }

    /// Makes every action on a run answer with a conflict.
    pub(crate) fn failing_actions_for(mut self, run_id: &str) -> Self {
        self.failing_runs.insert(run_id.to_string());
        self
    }

    /// Answers every listing request with its first page, whatever page was
    /// asked for.
    pub(crate) fn ignoring_page_number(mut self) -> Self {
        self.ignores_page_number = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the apply/discard/cancel calls, in order.
    pub(crate) fn action_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::Apply { .. } | Call::Discard { .. } | Call::Cancel { .. }
                )
            })
            .collect()
    }

    /// Pages requested for a workspace's runs, in order.
    pub(crate) fn run_pages_requested(&self, workspace_id: &str) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ListRuns {
                    workspace_id: id,
                    page,
                } if id == workspace_id => Some(page),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn served_page(&self, requested: u32) -> u32 {
        if self.ignores_page_number {
            1
        } else {
            requested
        }
    }

    fn action_result(&self, run_id: &str) -> Result<(), TfeError> {
        if self.failing_runs.contains(run_id) {
            Err(TfeError::Api {
                status: 409,
                message: "transition not allowed".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RunQueueClient for MockRunQueueClient {
    async fn list_workspaces(
        &self,
        organization: &str,
        options: &WorkspaceListOptions,
    ) -> Result<Page<WorkspaceRecord>, TfeError> {
        assert!(
            options.include_current_run,
            "workspaces must be listed with their current run"
        );
        self.record(Call::ListWorkspaces {
            organization: organization.to_string(),
            search: options.search.clone(),
            page: options.page_number,
        });

        if self.failing_workspace_page == Some(options.page_number) {
            return Err(server_error());
        }

        page_at(&self.workspace_pages, self.served_page(options.page_number))
    }

    async fn list_runs(
        &self,
        workspace_id: &str,
        options: &RunListOptions,
    ) -> Result<Page<RunRecord>, TfeError> {
        self.record(Call::ListRuns {
            workspace_id: workspace_id.to_string(),
            page: options.page_number,
        });

        if self.failing_run_pages.get(workspace_id) == Some(&options.page_number) {
            return Err(server_error());
        }

        match self.run_pages.get(workspace_id) {
            Some(pages) => page_at(pages, self.served_page(options.page_number)),
            None => Err(TfeError::NotFound),
        }
    }

    async fn apply_run(&self, run_id: &str, comment: &str) -> Result<(), TfeError> {
        self.record(Call::Apply {
            run_id: run_id.to_string(),
            comment: comment.to_string(),
        });
        self.action_result(run_id)
    }

    async fn discard_run(&self, run_id: &str, comment: &str) -> Result<(), TfeError> {
        self.record(Call::Discard {
            run_id: run_id.to_string(),
            comment: comment.to_string(),
        });
        self.action_result(run_id)
    }

    async fn cancel_run(&self, run_id: &str, comment: &str) -> Result<(), TfeError> {
        self.record(Call::Cancel {
            run_id: run_id.to_string(),
            comment: comment.to_string(),
        });
        self.action_result(run_id)
    }
}

fn pagination(page_number: u32, has_next: bool) -> Pagination {
    Pagination {
        current_page: page_number,
        next_page: has_next.then_some(page_number + 1),
        prev_page: (page_number > 1).then(|| page_number - 1),
        ..Default::default()
    }
}

fn page_at<T: Clone>(pages: &[Page<T>], page_number: u32) -> Result<Page<T>, TfeError> {
    page_number
        .checked_sub(1)
        .and_then(|index| pages.get(index as usize))
        .cloned()
        .ok_or(TfeError::NotFound)
}

fn server_error() -> TfeError {
    TfeError::Api {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}

pub(crate) fn run(id: &str, status: RunStatus) -> RunRecord {
    RunRecord {
        id: id.to_string(),
        status,
    }
}

pub(crate) fn workspace(
    id: &str,
    name: &str,
    auto_apply: bool,
    current_run: Option<(&str, RunStatus)>,
) -> WorkspaceRecord {
    WorkspaceRecord {
        id: id.to_string(),
        name: name.to_string(),
        auto_apply,
        current_run: current_run.map(|(run_id, status)| CurrentRun {
            id: run_id.to_string(),
            status,
        }),
    }
}
