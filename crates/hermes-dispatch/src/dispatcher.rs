//! The dispatcher: a route table of bound routes.
//!
//! Built once from a contract, its handlers and [`DispatchOptions`]. After
//! [`DispatcherBuilder::build`] returns, the dispatcher is immutable and can
//! be shared across tasks behind an `Arc`.
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_dispatch::Dispatcher;
//!
//! let dispatcher = Dispatcher::builder(contract, handlers)
//!     .options(DispatchOptions::new().response_validation(true))
//!     .build()?;
//!
//! let response = dispatcher.dispatch(request).await;
//! ```

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use hermes_core::{
    ConfigurationError, ContractNode, DispatchError, DispatchOptions, HandlerNode, Reply, Request,
    RequestId,
};
use hermes_router::{Lookup, RouteError, Router};
use hermes_telemetry::metrics::record_request;
use http::{HeaderName, HeaderValue, Method};
use http_body_util::Full;
use tracing::Instrument;
use uuid::Uuid;

use crate::binder::{bind, RouteRegistrar};
use crate::failure::reply_error;
use crate::input::params_value;
use crate::pipeline::{BoundRoute, Dispatched, Outcome};

/// Header carrying the request ID in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Route label recorded for requests that matched no route.
const UNMATCHED_ROUTE: &str = "<unmatched>";

/// Routes requests to bound endpoints.
#[derive(Debug)]
pub struct Dispatcher {
    router: Router,
    routes: Vec<Arc<BoundRoute>>,
    options: Arc<DispatchOptions>,
}

/// Builder for [`Dispatcher`].
#[derive(Debug)]
pub struct DispatcherBuilder {
    contract: ContractNode,
    handlers: HandlerNode,
    options: DispatchOptions,
}

impl DispatcherBuilder {
    /// Sets the dispatch options.
    #[must_use]
    pub fn options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Binds every endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the handler tree does not mirror
    /// the contract, a composed path is malformed, or two endpoints share a
    /// method and path.
    pub fn build(self) -> Result<Dispatcher, ConfigurationError> {
        let mut table = RouteTable::default();
        let options = self.options.clone();
        let count = bind(&self.contract, &self.handlers, self.options, &mut table)?;
        tracing::info!(routes = count, "dispatcher ready");

        Ok(Dispatcher {
            router: table.router,
            routes: table.routes,
            options: Arc::new(options),
        })
    }
}

#[derive(Default)]
struct RouteTable {
    router: Router,
    routes: Vec<Arc<BoundRoute>>,
}

impl RouteRegistrar for RouteTable {
    fn register(&mut self, route: Arc<BoundRoute>) -> Result<(), ConfigurationError> {
        self.router
            .insert(route.method(), route.path(), self.routes.len())
            .map_err(|error| match error {
                RouteError::Duplicate { method, path } => ConfigurationError::DuplicateRoute {
                    method,
                    route: path,
                },
                RouteError::Malformed { path, reason } => ConfigurationError::malformed(path, reason),
            })?;
        self.routes.push(route);
        Ok(())
    }
}

impl Dispatcher {
    /// Creates a builder with default options.
    #[must_use]
    pub fn builder(contract: ContractNode, handlers: HandlerNode) -> DispatcherBuilder {
        DispatcherBuilder {
            contract,
            handlers,
            options: DispatchOptions::default(),
        }
    }

    /// Builds a dispatcher in one call.
    ///
    /// # Errors
    ///
    /// See [`DispatcherBuilder::build`].
    pub fn new(
        contract: ContractNode,
        handlers: HandlerNode,
        options: DispatchOptions,
    ) -> Result<Self, ConfigurationError> {
        Self::builder(contract, handlers).options(options).build()
    }

    /// Lists `(method, path)` of every bound route in registration order.
    #[must_use]
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.routes
            .iter()
            .map(|route| (route.method().clone(), route.path().to_string()))
            .collect()
    }

    /// Returns the bound routes.
    #[must_use]
    pub fn bound_routes(&self) -> &[Arc<BoundRoute>] {
        &self.routes
    }

    /// Returns the options every route was bound with.
    #[must_use]
    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Dispatches an HTTP request and returns the HTTP response.
    pub async fn dispatch(&self, request: http::Request<Bytes>) -> http::Response<Full<Bytes>> {
        let (parts, body) = request.into_parts();
        let request = Request::new(parts.method, parts.uri, parts.headers, body);
        self.handle(request).await.reply.into_response()
    }

    /// Dispatches a request and reports how it ended.
    pub async fn handle(&self, mut request: Request) -> Dispatched {
        request.request_id = self.request_id(&request);
        let span = tracing::info_span!(
            "request",
            request_id = %request.request_id,
            method = %request.method,
            path = request.path(),
        );

        async move {
            let started = Instant::now();
            let request_id = request.request_id;

            let (route, mut dispatched) = match self.router.lookup(&request.method, request.path()) {
                Lookup::Found(found) => match self.routes.get(found.route_id) {
                    Some(route) => {
                        request.params = params_value(&found.params);
                        (route.path().to_string(), route.handle(request).await)
                    }
                    None => (UNMATCHED_ROUTE.to_string(), self.unmatched(&request, Vec::new())),
                },
                Lookup::MethodNotAllowed(allowed) => {
                    (UNMATCHED_ROUTE.to_string(), self.unmatched(&request, allowed))
                }
                Lookup::NotFound => (UNMATCHED_ROUTE.to_string(), self.unmatched(&request, Vec::new())),
            };

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                dispatched
                    .reply
                    .header(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            let status = dispatched.reply.status_code().as_u16();
            let elapsed = started.elapsed();
            record_request(&route, status, elapsed);
            tracing::info!(
                route = %route,
                status,
                outcome = dispatched.outcome.as_str(),
                elapsed = ?elapsed,
                "request completed"
            );
            dispatched
        }
        .instrument(span)
        .await
    }

    fn request_id(&self, request: &Request) -> RequestId {
        if !self.options.trust_request_id {
            return request.request_id;
        }
        request
            .header(REQUEST_ID_HEADER)
            .and_then(|value| Uuid::parse_str(value).ok())
            .map_or(request.request_id, RequestId::from)
    }

    /// Replies to a request no route accepts. Hooks do not run.
    fn unmatched(&self, request: &Request, allowed: Vec<Method>) -> Dispatched {
        let error = if allowed.is_empty() {
            DispatchError::NotFound {
                method: request.method.clone(),
                path: request.path().to_string(),
            }
        } else {
            DispatchError::MethodNotAllowed {
                method: request.method.clone(),
                path: request.path().to_string(),
                allowed,
            }
        };

        let mut reply = Reply::new();
        reply_error(&error, request, &self.options, &mut reply);
        Dispatched {
            reply,
            outcome: Outcome::of(&error),
        }
    }
}
