//! Link chain composition.
//!
//! A link receives the request and the rest of the chain. It may inspect or
//! rewrite the request before calling `next`, and observe the result after.

use gqlds_core::{OperationRequest, Response, TransportError};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Result flowing back through the chain.
pub type LinkResult = Result<Response, TransportError>;

/// Boxed future returned by links.
pub type LinkFuture = Pin<Box<dyn Future<Output = LinkResult> + Send>>;

/// Next link in the chain.
pub type Next = Arc<dyn Fn(OperationRequest) -> LinkFuture + Send + Sync>;

/// Link function type.
pub type Link = Arc<dyn Fn(OperationRequest, Next) -> LinkFuture + Send + Sync>;

/// Wraps a closure as a [`Link`].
pub fn link<F>(f: F) -> Link
where
    F: Fn(OperationRequest, Next) -> LinkFuture + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Composes links in order in front of a terminal handler.
///
/// The first link is outermost: it sees the request first and the result last.
pub fn compose(links: Vec<Link>, terminal: Next) -> Next {
    // Build the chain from the end
    let mut next = terminal;
    for current in links.into_iter().rev() {
        let current_next = next;
        next = Arc::new(move |req| {
            let current = current.clone();
            let next = current_next.clone();
            Box::pin(async move { current(req, next).await })
        });
    }
    next
}
