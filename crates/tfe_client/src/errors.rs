//! Error types for Terraform Cloud client operations.
//!
//! This module defines the error types that can occur when talking to the
//! Terraform Cloud (or Terraform Enterprise) API through the tfe_client crate.

use reqwest::StatusCode;
use serde::Deserialize;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during Terraform Cloud client operations.
///
/// ## Examples
///
/// ```rust,ignore
/// use tfe_client::Error;
///
/// match client.apply_run("run-abc123", "Applying run automatically").await {
///     Ok(()) => println!("Run applied"),
///     Err(Error::Unauthorized) => eprintln!("Token rejected"),
///     Err(Error::NotFound) => eprintln!("Run no longer exists"),
///     Err(err) => eprintln!("Other error: {}", err),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service returned a non-success status that has no dedicated variant.
    ///
    /// The message is assembled from the JSON:API `errors` array when the body
    /// contains one, and from the raw body otherwise.
    #[error("API request failed with status {status}: {message}")]
    Api {
        /// HTTP status code returned by the service
        status: u16,
        /// Human readable error description
        message: String,
    },

    /// Error deserializing a response document.
    ///
    /// The service answered with a body that is not the JSON:API document the
    /// client expects for this endpoint.
    #[error("Failed to deserialize Terraform Cloud response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// Transport level failure (connection refused, TLS, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured service address cannot be used as an API base URL.
    #[error("Invalid service address: {0}")]
    InvalidAddress(String),

    /// The API token contains characters that cannot be sent in an HTTP header.
    #[error("API token cannot be used as an authorization header")]
    InvalidToken,

    /// The requested resource was not found.
    ///
    /// Terraform Cloud also answers 404 when the token has no access to the
    /// organization or workspace.
    #[error("Resource not found")]
    NotFound,

    /// The API rate limit has been exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The API token was rejected.
    #[error("Authentication failed: the API token was rejected")]
    Unauthorized,
}

impl Error {
    /// Maps a non-success HTTP status and its response body to an error.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Error::Unauthorized,
            StatusCode::NOT_FOUND => Error::NotFound,
            StatusCode::TOO_MANY_REQUESTS => Error::RateLimitExceeded,
            _ => Error::Api {
                status: status.as_u16(),
                message: api_error_message(status, body),
            },
        }
    }
}

/// JSON:API error document.
#[derive(Debug, Deserialize)]
struct ErrorDocument {
    #[serde(default)]
    errors: Vec<ErrorObject>,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    title: Option<String>,
    detail: Option<String>,
}

fn api_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(document) = serde_json::from_str::<ErrorDocument>(body) {
        let messages: Vec<String> = document
            .errors
            .into_iter()
            .filter_map(|e| match (e.title, e.detail) {
                (Some(title), Some(detail)) => Some(format!("{title}: {detail}")),
                (Some(text), None) | (None, Some(text)) => Some(text),
                (None, None) => None,
            })
            .collect();

        if !messages.is_empty() {
            return messages.join("; ");
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}
