//! Failures produced below the data-source facade.
//!
//! [`TransportError`] is what the link chain yields when an operation fails.
//! It is never shown to callers directly; the SDK translates it into an API
//! error.

use thiserror::Error;

use crate::response::{GraphQLError, Response};

/// A GraphQL document could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid GraphQL document: {message}")]
pub struct DocumentError {
    pub message: String,
}

impl DocumentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A network or HTTP-level failure.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{reason}")]
pub struct TransportError {
    /// HTTP status, when the upstream answered at all.
    pub status_code: Option<u16>,
    /// Raw response body, when one was read.
    pub body_text: Option<String>,
    /// GraphQL errors found in the response body.
    pub graphql_errors: Vec<GraphQLError>,
    /// Description for logs.
    pub reason: String,
}

impl TransportError {
    /// Creates a failure with no HTTP details.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            status_code: None,
            body_text: None,
            graphql_errors: Vec::new(),
            reason: reason.into(),
        }
    }

    /// Creates a failure for a non-success HTTP response.
    ///
    /// GraphQL errors are picked out of the body when it is a GraphQL response.
    pub fn http(status: u16, body_text: impl Into<String>) -> Self {
        let body_text = body_text.into();
        let graphql_errors = serde_json::from_str::<Response>(&body_text)
            .ok()
            .and_then(|response| response.errors)
            .unwrap_or_default();

        Self {
            status_code: Some(status),
            body_text: Some(body_text),
            graphql_errors,
            reason: format!("Response not successful: Received status code {status}"),
        }
    }

    /// Creates a network failure (connection, TLS, timeout).
    pub fn network(reason: impl Into<String>) -> Self {
        Self::new(reason)
    }

    /// Sets the HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Sets the body text.
    pub fn with_body_text(mut self, body_text: impl Into<String>) -> Self {
        self.body_text = Some(body_text.into());
        self
    }
}
