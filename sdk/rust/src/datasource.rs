//! GraphQL data source.
//!
//! One data source fronts one upstream GraphQL service. It is built once and
//! shared across requests; every call runs through a fresh link chain:
//!
//! 1. error observation (logging only)
//! 2. the optional outgoing-request hook
//! 3. the transport, bound to the base URL
//!
//! Failures are translated into [`ApiError`](crate::error::ApiError)s after
//! the chain returns.
//!
//! # Example
//!
//! ```ignore
//! use gqlds_sdk::{hook_fn, DataSourceConfig, GraphQLDataSource, OperationDocument, OperationOptions};
//!
//! let users = GraphQLDataSource::new(DataSourceConfig::new("https://users.internal/graphql"))?
//!     .with_hook(hook_fn(|request| request.set_header("authorization", "Bearer secret")));
//!
//! let get_user = OperationDocument::parse("query GetUser($id: ID!) { user(id: $id) { id name } }")?;
//! let response = users
//!     .query(&get_user, OperationOptions::new().variable("id", "42"))
//!     .await?;
//! ```

use gqlds_core::{OperationDocument, OperationKind, OperationRequest, Response};
use gqlds_link::{
    compose, error_link, hook, transport, CachingTransport, HttpTransport, NormalizedCache, Next,
    RequestHook, Transport,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::DataSourceConfig;
use crate::error::{ConfigError, DataSourceResult};
use crate::request::{build_request, OperationOptions};
use crate::translate::did_encounter_error;

/// An upstream GraphQL service used as a data source.
#[derive(Clone)]
pub struct GraphQLDataSource {
    config: DataSourceConfig,
    transport: Arc<dyn Transport>,
    cache: Option<Arc<RwLock<NormalizedCache>>>,
    hook: Option<Arc<dyn RequestHook>>,
}

impl GraphQLDataSource {
    /// Creates a data source sending requests over HTTP.
    pub fn new(config: DataSourceConfig) -> DataSourceResult<Self> {
        let http = HttpTransport::new(config.timeout, config.headers.clone())
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self::with_transport(config, Arc::new(http)))
    }

    /// Creates a data source sending requests through a custom transport.
    ///
    /// The normalized cache, when enabled, wraps this transport.
    pub fn with_transport(config: DataSourceConfig, transport: Arc<dyn Transport>) -> Self {
        let mut cache = None;
        let transport: Arc<dyn Transport> = if config.use_normalized_cache {
            let caching = CachingTransport::new(transport);
            cache = Some(caching.cache());
            Arc::new(caching)
        } else {
            transport
        };

        Self {
            config,
            transport,
            cache,
            hook: None,
        }
    }

    /// Installs the outgoing-request hook.
    #[must_use]
    pub fn with_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Sets the base URL.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.config.base_url = Some(base_url.into());
    }

    /// Returns the base URL, if configured.
    pub fn base_url(&self) -> Option<&str> {
        self.config.base_url.as_deref()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    /// Returns the normalized cache, when enabled.
    pub fn normalized_cache(&self) -> Option<Arc<RwLock<NormalizedCache>>> {
        self.cache.clone()
    }

    /// Runs a query.
    pub async fn query(
        &self,
        document: &OperationDocument,
        options: OperationOptions,
    ) -> DataSourceResult<Response> {
        let request = build_request(OperationKind::Query, document.clone(), options)?;
        self.execute_single_operation(request).await
    }

    /// Runs a mutation.
    pub async fn mutation(
        &self,
        document: &OperationDocument,
        options: OperationOptions,
    ) -> DataSourceResult<Response> {
        let request = build_request(OperationKind::Mutation, document.clone(), options)?;
        self.execute_single_operation(request).await
    }

    async fn execute_single_operation(
        &self,
        request: OperationRequest,
    ) -> DataSourceResult<Response> {
        let chain = self.compose_links()?;

        debug!(
            operation = request.operation_name.as_deref(),
            kind = %request.kind,
            "Executing upstream operation"
        );

        match chain(request).await {
            Ok(response) => Ok(response),
            Err(err) => {
                let api_error = did_encounter_error(&err);
                warn!(
                    status = err.status_code,
                    code = api_error.kind().code(),
                    "Upstream operation failed: {}",
                    err
                );
                Err(api_error.into())
            }
        }
    }

    fn compose_links(&self) -> Result<Next, ConfigError> {
        let url = self.config.resolve_url()?;

        Ok(compose(
            vec![error_link::on_error(), hook::on_request(self.hook.clone())],
            transport::terminal(self.transport.clone(), url),
        ))
    }
}

impl fmt::Debug for GraphQLDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQLDataSource")
            .field("base_url", &self.config.base_url)
            .field("has_hook", &self.hook.is_some())
            .field("normalized_cache", &self.cache.is_some())
            .finish()
    }
}
