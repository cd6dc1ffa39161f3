//! JSON:API documents exchanged with the Terraform Cloud API.
//!
//! Only the members the client reads are modelled; everything else in the
//! documents is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{CurrentRun, Page, Pagination, RunRecord, RunStatus, WorkspaceRecord};

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;

/// Media type required by the API for request and response bodies.
pub(crate) const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

#[derive(Debug, Deserialize)]
pub(crate) struct WorkspaceListDocument {
    data: Vec<WorkspaceResource>,
    #[serde(default)]
    included: Vec<IncludedResource>,
    #[serde(default)]
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct WorkspaceResource {
    id: String,
    attributes: WorkspaceAttributes,
    #[serde(default)]
    relationships: WorkspaceRelationships,
}

#[derive(Debug, Deserialize)]
struct WorkspaceAttributes {
    name: String,
    #[serde(rename = "auto-apply", default)]
    auto_apply: bool,
}

#[derive(Debug, Default, Deserialize)]
struct WorkspaceRelationships {
    #[serde(rename = "current-run", default)]
    current_run: Option<Relationship>,
}

#[derive(Debug, Deserialize)]
struct Relationship {
    #[serde(default)]
    data: Option<ResourceIdentifier>,
}

#[derive(Debug, Deserialize)]
struct ResourceIdentifier {
    id: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct IncludedResource {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    attributes: IncludedAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct IncludedAttributes {
    status: Option<RunStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunListDocument {
    data: Vec<RunResource>,
    #[serde(default)]
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct RunResource {
    id: String,
    attributes: RunAttributes,
}

#[derive(Debug, Deserialize)]
struct RunAttributes {
    status: RunStatus,
}

#[derive(Debug, Deserialize)]
struct Meta {
    pagination: Option<Pagination>,
}

/// Body of the run action endpoints (apply, discard, cancel).
#[derive(Debug, Serialize)]
pub(crate) struct RunActionBody<'a> {
    pub(crate) comment: &'a str,
}

fn pagination_or_single(meta: Option<Meta>, page_number: u32, item_count: usize) -> Pagination {
    match meta.and_then(|m| m.pagination) {
        Some(pagination) if pagination.current_page == 0 => Pagination {
            current_page: page_number,
            ..pagination
        },
        Some(pagination) => pagination,
        None => Pagination::single(page_number, item_count),
    }
}

impl WorkspaceListDocument {
    /// Flattens the document into a page of workspaces, resolving each
    /// workspace's `current-run` relationship against the included runs.
    pub(crate) fn into_page(self, page_number: u32) -> Page<WorkspaceRecord> {
        let run_statuses: HashMap<String, RunStatus> = self
            .included
            .into_iter()
            .filter(|r| r.kind == "runs")
            .filter_map(|r| r.attributes.status.map(|status| (r.id, status)))
            .collect();

        let items: Vec<WorkspaceRecord> = self
            .data
            .into_iter()
            .map(|ws| {
                let current_run = ws
                    .relationships
                    .current_run
                    .and_then(|rel| rel.data)
                    .filter(|id| id.kind == "runs")
                    .and_then(|id| {
                        run_statuses.get(&id.id).map(|status| CurrentRun {
                            id: id.id.clone(),
                            status: status.clone(),
                        })
                    });

                WorkspaceRecord {
                    id: ws.id,
                    name: ws.attributes.name,
                    auto_apply: ws.attributes.auto_apply,
                    current_run,
                }
            })
            .collect();

        let pagination = pagination_or_single(self.meta, page_number, items.len());
        Page::new(items, pagination)
    }
}

impl RunListDocument {
    /// Flattens the document into a page of runs, preserving service order.
    pub(crate) fn into_page(self, page_number: u32) -> Page<RunRecord> {
        let items: Vec<RunRecord> = self
            .data
            .into_iter()
            .map(|run| RunRecord {
                id: run.id,
                status: run.attributes.status,
            })
            .collect();

        let pagination = pagination_or_single(self.meta, page_number, items.len());
        Page::new(items, pagination)
    }
}
