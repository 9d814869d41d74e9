//! Core types for GraphQL data sources.
//!
//! This crate provides the data model shared by the link chain and the SDK:
//! - `document`: Parsed operation documents
//! - `request`: The uniform operation request sent upstream
//! - `response`: Upstream responses and GraphQL errors
//! - `error`: Document and transport failures

pub mod document;
pub mod error;
pub mod request;
pub mod response;

pub use document::{OperationDocument, OperationKind};
pub use error::{DocumentError, TransportError};
pub use request::{Headers, JsonMap, OperationRequest, RequestBody};
pub use response::{GraphQLError, Location, Response};
