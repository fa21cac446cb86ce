//! HTTP server.
//!
//! Accepts TCP connections, serves HTTP/1.1 with hyper and hands every
//! request to a shared [`Dispatcher`]. Two built-in endpoints are answered
//! before dispatch: health and, once a recorder is installed, Prometheus
//! metrics.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hermes_server::{Server, ServerConfig};
//!
//! let server = Server::new(
//!     ServerConfig::builder().http_addr("0.0.0.0:8080").build(),
//!     Arc::new(dispatcher),
//! );
//! server.run().await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use hermes_core::error::ErrorDetail;
use hermes_core::{ErrorEnvelope, JSON_CONTENT_TYPE};
use hermes_dispatch::Dispatcher;
use hermes_telemetry::render_metrics;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::health::HealthCheck;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// HTTP response type produced by the server.
pub type HttpResponse = Response<Full<Bytes>>;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Serves a [`Dispatcher`] over HTTP.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    health: HealthCheck,
    draining: AtomicBool,
}

impl Server {
    /// Creates a server for `dispatcher`.
    #[must_use]
    pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            config,
            dispatcher,
            health: HealthCheck::new("hermes", env!("CARGO_PKG_VERSION")),
            draining: AtomicBool::new(false),
        }
    }

    /// Sets the service name and version reported by the health endpoint.
    #[must_use]
    pub fn with_service(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.health = HealthCheck::new(name, version);
        self
    }

    /// The server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The dispatcher requests are handed to.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Runs until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if a route is shadowed by a built-in endpoint or the
    /// address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and runs until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if a contract route is shadowed by a built-in
    /// endpoint or the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        self.check_builtins()?;
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// fires, then waits up to the shutdown timeout for open connections.
    ///
    /// # Errors
    ///
    /// Returns an error if a contract route is shadowed by a built-in
    /// endpoint or the listener's local address cannot be read.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        self.check_builtins()?;
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            routes = self.dispatcher.bound_routes().len(),
            "server listening"
        );

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        if let Some(limit) = server.config.max_connections() {
                            if tracker.active() >= limit {
                                tracing::warn!(remote_addr = %remote_addr, limit, "connection limit reached, dropping connection");
                                continue;
                            }
                        }

                        let server = Arc::clone(&server);
                        let guard = tracker.track();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(error) = server.handle_connection(stream, remote_addr, shutdown).await {
                                tracing::debug!(remote_addr = %remote_addr, error = %error, "connection error");
                            }
                            drop(guard);
                        });
                    }
                    Err(error) => tracing::error!(error = %error, "failed to accept connection"),
                },

                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, stopping accept loop");
                    break;
                }
            }
        }

        server.draining.store(true, Ordering::SeqCst);

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active(),
            timeout = ?timeout,
            "waiting for connections to close"
        );

        tokio::select! {
            () = tracker.drained() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(timeout) => tracing::warn!(
                active = tracker.active(),
                "shutdown timeout reached with connections still open"
            ),
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(self);
        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(request).await) }
        });

        let conn = http1::Builder::new()
            .keep_alive(self.config.keep_alive())
            .serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(remote_addr = %remote_addr, "closing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    /// Handles one request: built-in endpoints first, then the dispatcher.
    ///
    /// The body is collected under the configured size limit and timeout
    /// before dispatch.
    pub async fn handle<B>(&self, request: Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if request.method() == Method::GET {
            if let Some(response) = self.builtin(request.uri().path()) {
                return response;
            }
        }

        let (parts, body) = request.into_parts();
        let limited = Limited::new(body, self.config.max_body_bytes());

        let bytes = match tokio::time::timeout(self.config.body_timeout(), limited.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(error)) if error.is::<LengthLimitError>() => {
                tracing::debug!(
                    method = %parts.method,
                    path = parts.uri.path(),
                    limit = self.config.max_body_bytes(),
                    "request body too large"
                );
                return error_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "PAYLOAD_TOO_LARGE",
                    "Request body too large",
                );
            }
            Ok(Err(error)) => {
                tracing::debug!(error = %error, "failed to read request body");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "BODY_READ_ERROR",
                    "Failed to read request body",
                );
            }
            Err(_) => {
                tracing::warn!(
                    method = %parts.method,
                    path = parts.uri.path(),
                    timeout = ?self.config.body_timeout(),
                    "request body timed out"
                );
                return error_response(
                    StatusCode::REQUEST_TIMEOUT,
                    "REQUEST_TIMEOUT",
                    "Request body timed out",
                );
            }
        };

        self.dispatcher
            .dispatch(Request::from_parts(parts, bytes))
            .await
    }

    /// Rejects contract routes that an enabled built-in endpoint would answer.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::ShadowedRoute`] for the first GET route whose
    /// path equals the health or metrics path.
    pub fn check_builtins(&self) -> Result<(), ServerError> {
        let builtins = [self.config.health_path(), self.config.metrics_path()];
        let shadowed = self
            .dispatcher
            .routes()
            .into_iter()
            .find(|(method, path)| *method == Method::GET && builtins.contains(&Some(path.as_str())));

        match shadowed {
            Some((_, path)) => {
                tracing::error!(path = %path, "contract route shadowed by built-in endpoint");
                Err(ServerError::ShadowedRoute { path })
            }
            None => Ok(()),
        }
    }

    fn builtin(&self, path: &str) -> Option<HttpResponse> {
        if self.config.health_path() == Some(path) {
            let status = self.health.status(
                self.dispatcher.bound_routes().len(),
                self.draining.load(Ordering::SeqCst),
            );
            let code = if self.draining.load(Ordering::SeqCst) {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::OK
            };
            return Some(json_response(code, &status));
        }

        if self.config.metrics_path() == Some(path) {
            // Without an installed recorder the path falls through to dispatch.
            return render_metrics().map(|text| {
                let mut response = Response::new(Full::new(Bytes::from(text)));
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE));
                response
            });
        }

        None
    }
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}

fn error_response(status: StatusCode, code: &str, message: &str) -> HttpResponse {
    let envelope = ErrorEnvelope {
        error: ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
        },
        request_id: None,
    };
    json_response(status, &envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use hermes_core::{
        handler, ContractNode, DispatchOptions, Endpoint, Group, HandlerNode, HandlerResponse,
        HandlerResult,
    };
    use hyper::body::Frame;
    use serde_json::{json, Value};

    /// A body whose first frame never arrives.
    struct Stalled;

    impl Body for Stalled {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
            Poll::Pending
        }
    }

    async fn echo(request: hermes_core::Request) -> HandlerResult {
        Ok(HandlerResponse::ok(&request.body))
    }

    fn server(config: ServerConfig) -> Server {
        let contract: ContractNode = Group::new()
            .leaf("echo", Endpoint::post("/echo").build())
            .into();
        let handlers: HandlerNode = Group::new().leaf("echo", handler(echo)).into();
        let dispatcher = Dispatcher::new(contract, handlers, DispatchOptions::new()).unwrap();
        Server::new(config, Arc::new(dispatcher)).with_service("echo", "0.0.1")
    }

    fn server_with_status_route(config: ServerConfig, path: &str) -> Server {
        let contract: ContractNode = Group::new()
            .leaf("status", Endpoint::get(path).build())
            .into();
        let handlers: HandlerNode = Group::new().leaf("status", handler(echo)).into();
        let dispatcher = Dispatcher::new(contract, handlers, DispatchOptions::new()).unwrap();
        Server::new(config, Arc::new(dispatcher))
    }

    async fn body_json(response: HttpResponse) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = server(ServerConfig::default());
        let request = Request::get("/health").body(Full::new(Bytes::new())).unwrap();

        let response = server.handle(request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "echo");
        assert_eq!(body["routes"], 1);
    }

    #[tokio::test]
    async fn test_health_disabled_falls_through() {
        let server = server(ServerConfig::builder().health_path(None).build());
        let request = Request::get("/health").body(Full::new(Bytes::new())).unwrap();

        let response = server.handle(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dispatches_collected_body() {
        let server = server(ServerConfig::default());
        let request = Request::post("/echo")
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from_static(br#"{"ping":"pong"}"#)))
            .unwrap();

        let response = server.handle(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"ping": "pong"}));
    }

    #[tokio::test]
    async fn test_body_limit() {
        let server = server(ServerConfig::builder().max_body_bytes(4).build());
        let request = Request::post("/echo")
            .body(Full::new(Bytes::from_static(b"0123456789")))
            .unwrap();

        let response = server.handle(request).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await["error"]["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_body_timeout() {
        let server = server(
            ServerConfig::builder()
                .body_timeout(Duration::from_millis(10))
                .build(),
        );
        let request = Request::post("/echo").body(Stalled).unwrap();

        let response = server.handle(request).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    // ========================================================================
    // Built-in route conflicts
    // ========================================================================

    #[test]
    fn test_contract_route_on_health_path_rejected() {
        let server = server_with_status_route(ServerConfig::default(), "/health");

        let error = server.check_builtins().unwrap_err();
        assert!(matches!(error, ServerError::ShadowedRoute { ref path } if path == "/health"));
    }

    #[test]
    fn test_contract_route_on_metrics_path_rejected() {
        let server = server_with_status_route(ServerConfig::default(), "/metrics");
        assert!(matches!(
            server.check_builtins(),
            Err(ServerError::ShadowedRoute { .. })
        ));
    }

    #[test]
    fn test_disabled_builtin_frees_its_path() {
        let config = ServerConfig::builder().health_path(None).build();
        let freed = server_with_status_route(config, "/health");
        assert!(freed.check_builtins().is_ok());
        assert!(server(ServerConfig::default()).check_builtins().is_ok());
    }

    #[tokio::test]
    async fn test_serve_refuses_shadowed_route() {
        let server = server_with_status_route(ServerConfig::default(), "/health");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let result = server.serve(listener, ShutdownSignal::new()).await;
        assert!(matches!(result, Err(ServerError::ShadowedRoute { .. })));
    }
}
