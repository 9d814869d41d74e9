//! Upstream GraphQL responses.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::request::JsonMap;

/// A GraphQL response as returned by the upstream service.
///
/// `data` is `None` only when the member is absent; an explicit `"data": null`
/// is kept as `Some(Value::Null)`. Top-level members outside the three known
/// ones are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQLError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl Response {
    /// Creates a response carrying only data.
    pub fn from_data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    /// Returns the GraphQL errors in this response.
    pub fn graphql_errors(&self) -> &[GraphQLError] {
        self.errors.as_deref().unwrap_or_default()
    }

    /// Returns true if the upstream reported any GraphQL error.
    pub fn has_errors(&self) -> bool {
        !self.graphql_errors().is_empty()
    }

    /// Returns true if neither `data` nor `errors` was present.
    pub fn is_missing(&self) -> bool {
        self.data.is_none() && self.errors.is_none()
    }
}

/// A GraphQL error reported by the upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<JsonMap>,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: None,
            path: None,
            extensions: None,
        }
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message: {}", self.message)?;
        if let Some(locations) = &self.locations {
            let locations: Vec<String> = locations.iter().map(ToString::to_string).collect();
            write!(f, ", Location: {}", locations.join(", "))?;
        }
        if let Some(path) = &self.path {
            let path: Vec<String> = path
                .iter()
                .map(|segment| match segment {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            write!(f, ", Path: {}", path.join("."))?;
        }
        Ok(())
    }
}

/// A source location attached to a GraphQL error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_deserialization() {
        let response: Response = serde_json::from_str(
            r#"{"data":{"user":null},"errors":[{"message":"not found","path":["user"],"locations":[{"line":1,"column":3}]}]}"#,
        )
        .unwrap();

        assert!(response.has_errors());
        assert_eq!(response.graphql_errors()[0].message, "not found");
        assert_eq!(response.data, Some(serde_json::json!({"user": null})));
    }

    #[test]
    fn test_error_display() {
        let error = GraphQLError {
            message: "not found".into(),
            locations: Some(vec![Location { line: 1, column: 3 }]),
            path: Some(vec![serde_json::json!("users"), serde_json::json!(0)]),
            extensions: None,
        };

        assert_eq!(
            error.to_string(),
            "Message: not found, Location: 1:3, Path: users.0"
        );
    }

    #[test]
    fn test_explicit_null_data_is_kept() {
        let body = serde_json::json!({
            "data": null,
            "errors": [{"message": "boom"}],
            "hasNext": false
        });
        let response: Response = serde_json::from_value(body.clone()).unwrap();

        assert_eq!(response.data, Some(serde_json::Value::Null));
        assert_eq!(response.extra["hasNext"], false);
        assert!(!response.is_missing());
        assert_eq!(serde_json::to_value(&response).unwrap(), body);
    }

    #[test]
    fn test_absent_members_are_missing() {
        let response: Response = serde_json::from_str("{}").unwrap();

        assert_eq!(response.data, None);
        assert!(response.is_missing());
        assert_eq!(serde_json::to_string(&response).unwrap(), "{}");
    }

    #[test]
    fn test_data_only_response_serialization() {
        let response = Response::from_data(serde_json::json!({"hello": "world"}));
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"data":{"hello":"world"}}"#);
    }
}
