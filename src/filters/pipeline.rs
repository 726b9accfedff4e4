//! Action filter pipeline.
//!
//! # Responsibilities
//! - Resolve filter instances from markers on each activation
//! - Run before-hooks, the action, then after-hooks
//! - Turn resolution failures into a 500 response before any hook fires
//!
//! # Design Decisions
//! - Exposed as a tower Layer so it composes with axum's MethodRouter::layer
//! - The wrapping itself (`run_filtered`) knows nothing about HTTP
//! - After-hooks run in reverse order so the outermost filter sees the action last

use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::filters::{ActionDescriptor, ActionExecutedContext, ActionExecutingContext, ActionFilter};
use crate::services::{ResolveError, ServiceProvider};

/// Failure to activate the filters of an action.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("failed to activate filter {filter}: {source}")]
    Resolve {
        filter: &'static str,
        #[source]
        source: ResolveError,
    },
}

impl IntoResponse for FilterError {
    fn into_response(self) -> Response {
        let FilterError::Resolve { filter, .. } = &self;
        let body = serde_json::json!({
            "error": self.to_string(),
            "filter": filter,
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Run `action` wrapped by the hooks of `filters`.
///
/// Before-hooks run in order, after-hooks in reverse order. The action's
/// output is returned untouched.
pub async fn run_filtered<A, Fut, T, E>(
    filters: &[Arc<dyn ActionFilter>],
    executing: &ActionExecutingContext,
    action: A,
    executed: E,
) -> T
where
    A: FnOnce() -> Fut,
    Fut: Future<Output = T>,
    E: FnOnce(&T) -> ActionExecutedContext,
{
    for filter in filters {
        filter.on_action_executing(executing);
    }

    let output = action().await;

    let context = executed(&output);
    for filter in filters.iter().rev() {
        filter.on_action_executed(&context);
    }

    output
}

/// The markers of one action plus the provider they resolve from.
pub struct ActionFilterChain {
    descriptor: Arc<ActionDescriptor>,
    services: Arc<ServiceProvider>,
    /// One slot per marker; only reusable factories ever fill theirs.
    reusable: Vec<OnceLock<Arc<dyn ActionFilter>>>,
}

impl ActionFilterChain {
    pub fn new(descriptor: Arc<ActionDescriptor>, services: Arc<ServiceProvider>) -> Self {
        let reusable = descriptor.filters.iter().map(|_| OnceLock::new()).collect();
        Self {
            descriptor,
            services,
            reusable,
        }
    }

    pub fn descriptor(&self) -> &Arc<ActionDescriptor> {
        &self.descriptor
    }

    /// Produce one filter instance per marker, in marker order.
    pub fn activate(&self) -> Result<Vec<Arc<dyn ActionFilter>>, FilterError> {
        let mut filters = Vec::with_capacity(self.descriptor.filters.len());

        for (scoped, slot) in self.descriptor.filters.iter().zip(&self.reusable) {
            let factory = &scoped.factory;
            if factory.is_reusable() {
                if let Some(filter) = slot.get() {
                    filters.push(filter.clone());
                    continue;
                }
            }

            let filter = factory
                .create_instance(&self.services)
                .map_err(|source| FilterError::Resolve {
                    filter: factory.name(),
                    source,
                })?;

            if factory.is_reusable() {
                filters.push(slot.get_or_init(|| filter).clone());
            } else {
                filters.push(filter);
            }
        }

        Ok(filters)
    }
}

/// Layer applying an [`ActionFilterChain`] to an action handler.
#[derive(Clone)]
pub struct ActionFilterLayer {
    chain: Arc<ActionFilterChain>,
}

impl ActionFilterLayer {
    pub fn new(descriptor: Arc<ActionDescriptor>, services: Arc<ServiceProvider>) -> Self {
        Self {
            chain: Arc::new(ActionFilterChain::new(descriptor, services)),
        }
    }
}

impl<S> Layer<S> for ActionFilterLayer {
    type Service = ActionFilterService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ActionFilterService {
            inner,
            chain: self.chain.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ActionFilterService<S> {
    inner: S,
    chain: Arc<ActionFilterChain>,
}

impl<S> Service<Request> for ActionFilterService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        // The clone is not guaranteed ready; keep the one poll_ready drove.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let chain = self.chain.clone();

        Box::pin(async move {
            let descriptor = chain.descriptor().clone();

            let filters = match chain.activate() {
                Ok(filters) => filters,
                Err(e) => {
                    tracing::error!(
                        action = %descriptor.display_name(),
                        error = %e,
                        "Action filter activation failed"
                    );
                    return Ok(e.into_response());
                }
            };

            tracing::trace!(
                action = %descriptor.display_name(),
                filters = filters.len(),
                "Action filters activated"
            );

            let executing = ActionExecutingContext::from_request(descriptor.clone(), &request);
            request.extensions_mut().insert(descriptor.clone());
            let start = Instant::now();
            let request_id = executing.request_id.clone();

            let response = run_filtered(
                &filters,
                &executing,
                move || async move {
                    match inner.call(request).await {
                        Ok(response) => response,
                        Err(never) => match never {},
                    }
                },
                |response: &Response| ActionExecutedContext {
                    descriptor,
                    request_id,
                    status: response.status(),
                    elapsed: start.elapsed(),
                },
            )
            .await;

            Ok(response)
        })
    }
}
