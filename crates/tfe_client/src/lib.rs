//! Crate for interacting with the Terraform Cloud / Terraform Enterprise API.
//!
//! This crate provides a small client covering what is needed to unblock
//! stalled run queues: listing the workspaces of an organization (with their
//! current run inlined), listing the runs of a workspace, and applying,
//! discarding or cancelling a run. Requests are authenticated with a bearer
//! API token.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Response;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument};
use url::Url;

pub mod errors;
pub use errors::Error;

pub mod models;
pub use models::{CurrentRun, Page, Pagination, RunRecord, RunStatus, WorkspaceRecord};

mod document;
use document::{RunActionBody, RunListDocument, WorkspaceListDocument, JSON_API_MEDIA_TYPE};

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Address of the hosted Terraform Cloud service.
pub const DEFAULT_ADDRESS: &str = "https://app.terraform.io";

/// Page size used when none is configured. Matches the service default.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size the service accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

const API_PATH: &str = "api/v2/";

/// Options for listing the workspaces of an organization.
///
/// Use `Default::default()` and modify fields as needed.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceListOptions {
    /// Page to fetch, starting at 1. Zero is treated as 1.
    pub page_number: u32,

    /// Restrict the listing to workspaces whose name contains this term.
    pub search: Option<String>,

    /// Inline each workspace's current run in the response.
    pub include_current_run: bool,
}

/// Options for listing the runs of a workspace.
#[derive(Debug, Clone, Default)]
pub struct RunListOptions {
    /// Page to fetch, starting at 1. Zero is treated as 1.
    pub page_number: u32,
}

/// Operations on workspaces and their run queues.
///
/// This is the seam between the sweeper logic and the service; tests
/// substitute their own implementation.
#[async_trait]
pub trait RunQueueClient: Send + Sync {
    /// Lists one page of the workspaces in an organization.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the organization does not exist or is not
    /// visible to the token, and the transport/status errors of [`Error`]
    /// otherwise.
    async fn list_workspaces(
        &self,
        organization: &str,
        options: &WorkspaceListOptions,
    ) -> Result<Page<WorkspaceRecord>, Error>;

    /// Lists one page of the runs of a workspace, most recent first.
    async fn list_runs(
        &self,
        workspace_id: &str,
        options: &RunListOptions,
    ) -> Result<Page<RunRecord>, Error>;

    /// Applies a run that is waiting for confirmation.
    async fn apply_run(&self, run_id: &str, comment: &str) -> Result<(), Error>;

    /// Discards a run that is waiting for confirmation.
    async fn discard_run(&self, run_id: &str, comment: &str) -> Result<(), Error>;

    /// Cancels a run that is pending or in progress.
    async fn cancel_run(&self, run_id: &str, comment: &str) -> Result<(), Error>;
}

/// A client for the Terraform Cloud API, authenticated with an API token.
#[derive(Debug, Clone)]
pub struct TfeClient {
    http: reqwest::Client,
    base_url: Url,
    page_size: u32,
}

impl TfeClient {
    /// Creates a new client for the service at `address`.
    ///
    /// # Arguments
    ///
    /// * `address` - Service address, e.g. `https://app.terraform.io`. A path
    ///   prefix is kept, so Terraform Enterprise installations served below a
    ///   sub-path work too.
    /// * `token` - User, team or organization API token.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidAddress` if the address cannot carry a path,
    /// `Error::InvalidToken` if the token cannot be sent as a header and
    /// `Error::Http` if the underlying HTTP client cannot be built.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use secrecy::SecretString;
    /// use tfe_client::{TfeClient, DEFAULT_ADDRESS};
    /// use url::Url;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let address = Url::parse(DEFAULT_ADDRESS)?;
    /// let token = SecretString::from("my-api-token".to_string());
    /// let client = TfeClient::new(&address, &token)?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(token), fields(address = %address))]
    pub fn new(address: &Url, token: &SecretString) -> Result<Self, Error> {
        let base_url = api_base_url(address)?;

        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())).map_err(|_| {
                error!("API token contains characters that are not valid in a header");
                Error::InvalidToken
            })?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_API_MEDIA_TYPE));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("tfe-run-sweeper/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(base_url = %base_url, "Created Terraform Cloud client");

        Ok(Self {
            http,
            base_url,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Sets the number of items requested per page, clamped to `1..=100`.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Returns the configured page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidAddress(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn page_query(&self, page_number: u32) -> Vec<(&'static str, String)> {
        vec![
            ("page[number]", page_number.max(1).to_string()),
            ("page[size]", self.page_size.to_string()),
        ]
    }

    async fn get_document<D: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        operation: &str,
    ) -> Result<D, Error> {
        debug!(url = %url, "Sending GET request");
        let response = self.http.get(url).query(query).send().await.map_err(|e| {
            log_api_error(operation, &e);
            Error::Http(e)
        })?;

        let body = read_body(response, operation).await?;
        serde_json::from_slice(&body).map_err(|e| {
            log_api_error(operation, &e);
            Error::Deserialization(e)
        })
    }

    async fn post_run_action(
        &self,
        run_id: &str,
        action: &str,
        comment: &str,
    ) -> Result<(), Error> {
        let operation = format!("Failed to {action} run");
        let url = self.endpoint(&["runs", run_id, "actions", action])?;
        let body = serde_json::to_vec(&RunActionBody { comment })?;

        debug!(url = %url, "Sending POST request");
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, JSON_API_MEDIA_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                log_api_error(&operation, &e);
                Error::Http(e)
            })?;

        read_body(response, &operation).await?;
        Ok(())
    }
}

#[async_trait]
impl RunQueueClient for TfeClient {
    #[instrument(
        skip(self, options),
        fields(organization = %organization, page = options.page_number)
    )]
    async fn list_workspaces(
        &self,
        organization: &str,
        options: &WorkspaceListOptions,
    ) -> Result<Page<WorkspaceRecord>, Error> {
        let url = self.endpoint(&["organizations", organization, "workspaces"])?;

        let mut query = self.page_query(options.page_number);
        if let Some(search) = options.search.as_deref().filter(|s| !s.is_empty()) {
            query.push(("search[name]", search.to_string()));
        }
        if options.include_current_run {
            query.push(("include", "current_run".to_string()));
        }

        let document: WorkspaceListDocument = self
            .get_document(url, &query, "Failed to list workspaces")
            .await?;
        let page = document.into_page(options.page_number.max(1));

        debug!(
            count = page.items.len(),
            next_page = ?page.pagination.next_page,
            "Retrieved workspace page"
        );
        Ok(page)
    }

    #[instrument(
        skip(self, options),
        fields(workspace_id = %workspace_id, page = options.page_number)
    )]
    async fn list_runs(
        &self,
        workspace_id: &str,
        options: &RunListOptions,
    ) -> Result<Page<RunRecord>, Error> {
        let url = self.endpoint(&["workspaces", workspace_id, "runs"])?;
        let query = self.page_query(options.page_number);

        let document: RunListDocument = self
            .get_document(url, &query, "Failed to list runs")
            .await?;
        let page = document.into_page(options.page_number.max(1));

        debug!(
            count = page.items.len(),
            next_page = ?page.pagination.next_page,
            "Retrieved run page"
        );
        Ok(page)
    }

    #[instrument(skip(self, comment), fields(run_id = %run_id))]
    async fn apply_run(&self, run_id: &str, comment: &str) -> Result<(), Error> {
        self.post_run_action(run_id, "apply", comment).await
    }

    #[instrument(skip(self, comment), fields(run_id = %run_id))]
    async fn discard_run(&self, run_id: &str, comment: &str) -> Result<(), Error> {
        self.post_run_action(run_id, "discard", comment).await
    }

    #[instrument(skip(self, comment), fields(run_id = %run_id))]
    async fn cancel_run(&self, run_id: &str, comment: &str) -> Result<(), Error> {
        self.post_run_action(run_id, "cancel", comment).await
    }
}

/// Builds the `/api/v2/` base URL below the service address, keeping any
/// path prefix the address carries.
fn api_base_url(address: &Url) -> Result<Url, Error> {
    if address.cannot_be_a_base() {
        error!(address = %address, "Service address cannot be used as a base URL");
        return Err(Error::InvalidAddress(address.to_string()));
    }

    let mut base = address.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.set_query(None);
    base.set_fragment(None);

    base.join(API_PATH)
        .map_err(|e| Error::InvalidAddress(format!("{address}: {e}")))
}

async fn read_body(response: Response, operation: &str) -> Result<Vec<u8>, Error> {
    let status = response.status();
    let body = response.bytes().await.map_err(|e| {
        log_api_error(operation, &e);
        Error::Http(e)
    })?;

    if !status.is_success() {
        let err = Error::from_status(status, &String::from_utf8_lossy(&body));
        log_api_error(operation, &err);
        return Err(err);
    }

    Ok(body.to_vec())
}

fn log_api_error(message: &str, e: &dyn std::fmt::Display) {
    error!(
        error_message = %e,
        "{}. Received an error from Terraform Cloud",
        message
    );
}
