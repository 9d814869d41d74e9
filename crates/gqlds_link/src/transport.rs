//! Transport stage.
//!
//! The transport is the terminal of the chain: it performs the network call
//! against the data source's base URL.

use async_trait::async_trait;
use gqlds_core::{Headers, OperationRequest, Response, TransportError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::chain::{LinkResult, Next};

/// Performs a GraphQL request against an upstream URL.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, url: &Url, request: &OperationRequest) -> LinkResult;
}

/// HTTP transport using a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    headers: Headers,
}

impl HttpTransport {
    /// Creates a transport with a request timeout and default headers.
    ///
    /// Per-request headers override defaults with the same name.
    pub fn new(timeout: Duration, headers: Headers) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, headers })
    }

    fn header_map(&self, request: &OperationRequest) -> Result<HeaderMap, TransportError> {
        let mut map = HeaderMap::new();
        for (key, value) in self.headers.iter().chain(request.headers.iter()) {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| TransportError::new(format!("Invalid header name {key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::new(format!("Invalid header value for {key}: {e}")))?;
            map.insert(name, value);
        }
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(map)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, url: &Url, request: &OperationRequest) -> LinkResult {
        let headers = self.header_map(request)?;

        debug!(
            url = %url,
            operation = request.operation_name.as_deref(),
            kind = %request.kind,
            "Sending upstream request"
        );

        let response = self
            .client
            .post(url.clone())
            .headers(headers)
            .json(&request.body())
            .send()
            .await
            .map_err(|e| TransportError::network(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| {
                TransportError::network(format!("Failed to read response body: {e}"))
                    .with_status(status.as_u16())
            })?;

        if !status.is_success() {
            return Err(TransportError::http(status.as_u16(), body_text));
        }

        let parsed = match serde_json::from_str::<Response>(&body_text) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Err(TransportError::new(format!("Failed to parse response: {e}"))
                    .with_status(status.as_u16())
                    .with_body_text(body_text))
            }
        };

        if parsed.is_missing() {
            return Err(TransportError::new(format!(
                "Server response was missing for query '{}'",
                request.operation_name.as_deref().unwrap_or_default()
            ))
            .with_status(status.as_u16())
            .with_body_text(body_text));
        }

        Ok(parsed)
    }
}

/// Creates the terminal handler sending requests through `transport`.
pub fn terminal(transport: Arc<dyn Transport>, url: Url) -> Next {
    Arc::new(move |req| {
        let transport = transport.clone();
        let url = url.clone();
        Box::pin(async move { transport.send(&url, &req).await })
    })
}
