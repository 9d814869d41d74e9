//! Link chain for GraphQL data sources.
//!
//! A data source runs every operation through three links:
//!
//! 1. [`error_link::on_error`] logs GraphQL and network errors.
//! 2. [`hook::on_request`] lets the owner rewrite the request.
//! 3. [`transport::terminal`] sends it upstream through a [`Transport`].
//!
//! ```ignore
//! use gqlds_link::{compose, error_link, hook, transport};
//!
//! let chain = compose(
//!     vec![error_link::on_error(), hook::on_request(None)],
//!     transport::terminal(http_transport, url),
//! );
//! let response = chain(request).await?;
//! ```

pub mod cache;
pub mod chain;
pub mod error_link;
pub mod hook;
pub mod transport;

pub use cache::{CachingTransport, NormalizedCache};
pub use chain::{compose, link, Link, LinkFuture, LinkResult, Next};
pub use hook::{hook_fn, FnHook, RequestHook};
pub use transport::{HttpTransport, Transport};

pub use async_trait::async_trait;
pub use reqwest::Url;
