//! Request building.
//!
//! Turns a document plus caller options into the uniform
//! [`OperationRequest`] carried by the link chain.

use gqlds_core::{Headers, JsonMap, OperationDocument, OperationKind, OperationRequest};
use serde::Serialize;

use crate::error::{DataSourceError, DataSourceResult};

/// Optional parts of an operation.
#[derive(Debug, Clone, Default)]
pub struct OperationOptions {
    pub variables: JsonMap,
    pub operation_name: Option<String>,
    pub extensions: JsonMap,
    pub context: JsonMap,
    pub headers: Headers,
    invalid_variables: Option<String>,
}

impl OperationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the variables.
    ///
    /// The value must serialize to a JSON object. Anything else is reported
    /// when the operation runs, before any network call.
    pub fn variables<V: Serialize>(mut self, variables: V) -> Self {
        match serde_json::to_value(variables) {
            Ok(serde_json::Value::Object(map)) => self.variables = map,
            Ok(other) => self.reject(format!("expected an object, got {other}")),
            Err(e) => self.reject(e.to_string()),
        }
        self
    }

    /// Sets a single variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        let name = name.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.variables.insert(name, value);
            }
            Err(e) => self.reject(format!("{name}: {e}")),
        }
        self
    }

    fn reject(&mut self, reason: String) {
        self.invalid_variables.get_or_insert(reason);
    }

    /// Sets the operation name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Sets a protocol extension.
    pub fn extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    /// Sets a context entry.
    pub fn context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Adds a header for this request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// Builds the request for the given entry point.
///
/// The document lands in `query` for both queries and mutations. An explicit
/// operation name wins over the one found in the document. Fails if any
/// variable could not be serialized.
pub fn build_request(
    kind: OperationKind,
    document: OperationDocument,
    options: OperationOptions,
) -> DataSourceResult<OperationRequest> {
    let OperationOptions {
        variables,
        operation_name,
        extensions,
        context,
        headers,
        invalid_variables,
    } = options;

    if let Some(reason) = invalid_variables {
        return Err(DataSourceError::InvalidVariables(reason));
    }

    let mut request = OperationRequest::new(kind, document);
    request.variables = variables;
    request.extensions = extensions;
    request.context = context;
    request.headers = headers;
    if operation_name.is_some() {
        request.operation_name = operation_name;
    }
    Ok(request)
}
