//! GraphQL data sources.
//!
//! This crate lets a GraphQL gateway call upstream GraphQL services. A
//! [`GraphQLDataSource`] wraps one upstream URL and exposes `query` and
//! `mutation`; transport failures come back as typed API errors.
//!
//! # Usage
//!
//! ```ignore
//! use gqlds_sdk::{
//!     hook_fn, ApiErrorKind, DataSourceConfig, DataSourceError, GraphQLDataSource,
//!     OperationDocument, OperationOptions,
//! };
//!
//! let users = GraphQLDataSource::new(DataSourceConfig::new("https://users.internal/graphql"))?
//!     .with_hook(hook_fn(|request| {
//!         request.set_header("authorization", "Bearer secret");
//!     }));
//!
//! let get_user = OperationDocument::parse("query GetUser($id: ID!) { user(id: $id) { id name } }")?;
//!
//! match users.query(&get_user, OperationOptions::new().variable("id", "42")).await {
//!     Ok(response) => println!("{:?}", response.data),
//!     Err(DataSourceError::Api(err)) if err.kind() == ApiErrorKind::Authentication => {
//!         // ask the caller to log in again
//!     }
//!     Err(err) => return Err(err.into()),
//! }
//! ```

pub mod config;
pub mod datasource;
pub mod error;
pub mod request;
pub mod translate;

pub use config::DataSourceConfig;
pub use datasource::GraphQLDataSource;
pub use error::{ApiError, ApiErrorKind, ConfigError, DataSourceError, DataSourceResult};
pub use request::{build_request, OperationOptions};
pub use translate::did_encounter_error;

// Re-exports for convenience
pub use gqlds_core::{
    DocumentError, GraphQLError, Headers, JsonMap, OperationDocument, OperationKind,
    OperationRequest, Response, TransportError,
};
pub use gqlds_link::{
    async_trait, hook_fn, HttpTransport, LinkResult, NormalizedCache, RequestHook, Transport, Url,
};
