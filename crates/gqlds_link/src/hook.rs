//! Outgoing request hooks.
//!
//! A hook sees the normalized request right before transport and may rewrite
//! it, typically to attach credentials.
//!
//! # Example
//!
//! ```ignore
//! use gqlds_link::hook::hook_fn;
//!
//! let hook = hook_fn(|request| {
//!     request.set_header("authorization", "Bearer secret");
//! });
//! ```

use async_trait::async_trait;
use gqlds_core::{OperationRequest, TransportError};
use std::sync::Arc;
use tracing::debug;

use crate::chain::{link, Link};

/// A hook invoked with every request before it is sent.
#[async_trait]
pub trait RequestHook: Send + Sync {
    /// Mutates the request in place.
    ///
    /// Returning an error aborts the operation before any network activity.
    async fn will_send_request(&self, request: &mut OperationRequest)
        -> Result<(), TransportError>;
}

/// Adapts a synchronous closure into a [`RequestHook`].
pub struct FnHook<F>(F);

/// Creates a hook from a synchronous closure.
pub fn hook_fn<F>(f: F) -> FnHook<F>
where
    F: Fn(&mut OperationRequest) + Send + Sync + 'static,
{
    FnHook(f)
}

#[async_trait]
impl<F> RequestHook for FnHook<F>
where
    F: Fn(&mut OperationRequest) + Send + Sync + 'static,
{
    async fn will_send_request(
        &self,
        request: &mut OperationRequest,
    ) -> Result<(), TransportError> {
        (self.0)(request);
        Ok(())
    }
}

/// Creates the request hook link.
///
/// Without a hook the request is forwarded unchanged.
pub fn on_request(hook: Option<Arc<dyn RequestHook>>) -> Link {
    link(move |mut req, next| {
        let hook = hook.clone();
        Box::pin(async move {
            if let Some(hook) = hook {
                debug!(operation = req.operation_name.as_deref(), "Running request hook");
                hook.will_send_request(&mut req).await?;
            }
            next(req).await
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{compose, Next};
    use gqlds_core::{OperationDocument, OperationKind, Response};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request() -> OperationRequest {
        OperationRequest::new(
            OperationKind::Query,
            OperationDocument::parse("{ viewer { id } }").unwrap(),
        )
    }

    fn echo_headers() -> Next {
        Arc::new(|req: OperationRequest| {
            Box::pin(async move {
                let headers = serde_json::to_value(&req.headers).unwrap();
                Ok(Response::from_data(headers))
            })
        })
    }

    struct TokenHook {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RequestHook for TokenHook {
        async fn will_send_request(
            &self,
            request: &mut OperationRequest,
        ) -> Result<(), TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            request.set_header("authorization", "Bearer fetched");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_async_hook_mutation_reaches_next() {
        let hook = Arc::new(TokenHook {
            calls: AtomicUsize::new(0),
        });
        let chain = compose(vec![on_request(Some(hook.clone()))], echo_headers());

        let response = chain(request()).await.unwrap();

        assert_eq!(
            response.data,
            Some(serde_json::json!({"authorization": "Bearer fetched"}))
        );
        assert_eq!(hook.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fn_hook() {
        let hook = hook_fn(|req: &mut OperationRequest| req.set_header("x-tenant", "acme"));
        let chain = compose(vec![on_request(Some(Arc::new(hook)))], echo_headers());

        let response = chain(request()).await.unwrap();

        assert_eq!(response.data, Some(serde_json::json!({"x-tenant": "acme"})));
    }

    #[tokio::test]
    async fn test_without_hook_passes_through() {
        let chain = compose(vec![on_request(None)], echo_headers());

        let response = chain(request()).await.unwrap();

        assert_eq!(response.data, Some(serde_json::json!({})));
    }

    #[tokio::test]
    async fn test_failing_hook_skips_transport() {
        struct Failing;

        #[async_trait]
        impl RequestHook for Failing {
            async fn will_send_request(
                &self,
                _request: &mut OperationRequest,
            ) -> Result<(), TransportError> {
                Err(TransportError::new("token endpoint unavailable"))
            }
        }

        let sent = Arc::new(AtomicUsize::new(0));
        let counter = sent.clone();
        let terminal: Next = Arc::new(move |_req| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(Response::default()) })
        });

        let chain = compose(vec![on_request(Some(Arc::new(Failing)))], terminal);
        let err = chain(request()).await.unwrap_err();

        assert_eq!(err.reason, "token endpoint unavailable");
        assert_eq!(sent.load(Ordering::SeqCst), 0);
    }
}
