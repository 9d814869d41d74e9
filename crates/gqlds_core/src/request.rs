//! The uniform operation request.
//!
//! Queries and mutations travel the link chain in the same shape: the
//! document always sits in `query`, whichever entry point built the request.

use indexmap::IndexMap;
use serde::Serialize;

use crate::document::{OperationDocument, OperationKind};

/// An opaque JSON object.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Request headers, kept in insertion order.
pub type Headers = IndexMap<String, String>;

/// A normalized GraphQL operation request.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    /// Entry point the request was built for.
    pub kind: OperationKind,
    pub query: OperationDocument,
    pub variables: JsonMap,
    pub operation_name: Option<String>,
    pub extensions: JsonMap,
    /// Request-scoped data for hooks and links. Never sent upstream.
    pub context: JsonMap,
    /// Headers sent with this request only.
    pub headers: Headers,
}

impl OperationRequest {
    /// Creates a request with empty variables, extensions and context.
    ///
    /// The operation name defaults to the document's first named operation.
    pub fn new(kind: OperationKind, query: OperationDocument) -> Self {
        let operation_name = query.operation_name().map(str::to_owned);
        Self {
            kind,
            query,
            variables: JsonMap::new(),
            operation_name,
            extensions: JsonMap::new(),
            context: JsonMap::new(),
            headers: Headers::new(),
        }
    }

    /// Sets a header, replacing any previous value.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    /// Gets a header value.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Returns the JSON body sent upstream.
    pub fn body(&self) -> RequestBody<'_> {
        RequestBody {
            query: self.query.source(),
            variables: &self.variables,
            operation_name: self.operation_name.as_deref(),
            extensions: &self.extensions,
        }
    }
}

/// Wire form of an [`OperationRequest`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody<'a> {
    pub query: &'a str,
    pub variables: &'a JsonMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<&'a str>,
    #[serde(skip_serializing_if = "is_empty")]
    pub extensions: &'a JsonMap,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_empty(map: &&JsonMap) -> bool {
    map.is_empty()
}
