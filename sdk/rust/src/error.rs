//! Error types surfaced by data sources.
//!
//! Callers only ever see a [`DataSourceError`]: either the data source is
//! misconfigured, or the upstream call failed and was translated into an
//! [`ApiError`].

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Kind of an API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Upstream answered 401.
    Authentication,
    /// Upstream answered 403.
    Forbidden,
    /// Any other failure.
    Generic,
}

impl ApiErrorKind {
    /// Returns the error code exposed to GraphQL clients.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Authentication => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::Generic => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A translated upstream failure.
///
/// Only the error translator creates these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{kind}] {message}")]
pub struct ApiError {
    kind: ApiErrorKind,
    message: String,
    status_code: Option<u16>,
}

impl ApiError {
    pub(crate) fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
        }
    }

    pub(crate) fn with_status(mut self, status_code: Option<u16>) -> Self {
        self.status_code = status_code;
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    /// Returns the upstream body text, or an empty string.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the upstream HTTP status, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn is_authentication(&self) -> bool {
        self.kind == ApiErrorKind::Authentication
    }

    pub fn is_forbidden(&self) -> bool {
        self.kind == ApiErrorKind::Forbidden
    }
}

impl Serialize for ApiError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("ApiError", 2)?;
        state.serialize_field("code", self.kind.code())?;
        state.serialize_field("message", &self.message)?;
        state.end()
    }
}

/// The data source cannot run operations as configured.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Please provide a GraphQL base URL for this data source")]
    MissingBaseUrl,

    #[error("Invalid GraphQL base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Error returned by data source operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Invalid operation variables: {0}")]
    InvalidVariables(String),
}

impl DataSourceError {
    /// Returns the API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            Self::Configuration(_) | Self::InvalidVariables(_) => None,
        }
    }
}

/// Type alias for data source results.
pub type DataSourceResult<T> = std::result::Result<T, DataSourceError>;
