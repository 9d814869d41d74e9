//! Error observation link.
//!
//! Logs GraphQL and network errors as they flow back through the chain.
//! The result is always passed on untouched.

use gqlds_core::{Response, TransportError};
use tracing::error;

use crate::chain::{link, Link};

/// Creates the error observation link.
pub fn on_error() -> Link {
    link(|req, next| {
        Box::pin(async move {
            let operation = req.operation_name.clone();
            let result = next(req).await;
            match &result {
                Ok(response) => log_response_errors(operation.as_deref(), response),
                Err(err) => log_transport_error(operation.as_deref(), err),
            }
            result
        })
    })
}

fn log_response_errors(operation: Option<&str>, response: &Response) {
    for graphql_error in response.graphql_errors() {
        error!(operation, "[GraphQL error]: {}", graphql_error);
    }
}

fn log_transport_error(operation: Option<&str>, err: &TransportError) {
    for graphql_error in &err.graphql_errors {
        error!(operation, "[GraphQL error]: {}", graphql_error);
    }
    error!(
        operation,
        status = err.status_code,
        "[Network error]: {}",
        err
    );
}
