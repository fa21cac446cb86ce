//! Per-route request pipeline.
//!
//! ## Sequence
//!
//! 1. `onRequest` hooks
//! 2. `preParsing` hooks
//! 3. Query, header and body conversion
//! 4. `preValidation` hooks
//! 5. Validation of all four input locations
//! 6. `preHandler` hooks
//! 7. Handler
//! 8. Response resolution
//! 9. `onSend` hooks
//! 10. `onResponse` hooks
//!
//! A hook in phases 1, 2, 4 or 6 that sends the reply ends the request at
//! once; nothing after it runs, including `onSend` and `onResponse`. Any
//! failure before step 9 is turned into a reply by the error path, and the
//! request then continues with `onSend`.

use std::sync::Arc;

use hermes_core::{
    DispatchError, DispatchOptions, Endpoint, HandlerError, Phase, Reply, Request,
};
use http::Method;
use serde_json::Value;

use crate::chain::HookChain;
use crate::failure::reply_error;
use crate::flatten::BoundEndpoint;
use crate::input::{body_value, headers_value, query_value};
use crate::resolve::resolve_response;
use crate::validation::{validate_request, DecodeIssues};

/// How a dispatched request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The handler ran and its response was sent.
    Completed,
    /// A hook in this phase sent the reply.
    ShortCircuited(Phase),
    /// The request failed validation.
    RequestInvalid,
    /// The handler's response failed validation.
    ResponseInvalid,
    /// A hook or the handler failed.
    Failed,
    /// No route matched the path.
    NotFound,
    /// The path matched but the method is not bound.
    MethodNotAllowed,
}

impl Outcome {
    /// Returns the outcome a failure leads to.
    #[must_use]
    pub const fn of(error: &DispatchError) -> Self {
        match error {
            DispatchError::RequestInvalid(_) => Self::RequestInvalid,
            DispatchError::ResponseInvalid(_) => Self::ResponseInvalid,
            DispatchError::Hook { .. } | DispatchError::Handler(_) => Self::Failed,
            DispatchError::NotFound { .. } => Self::NotFound,
            DispatchError::MethodNotAllowed { .. } => Self::MethodNotAllowed,
        }
    }

    /// Returns the label used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::ShortCircuited(_) => "short_circuited",
            Self::RequestInvalid => "request_invalid",
            Self::ResponseInvalid => "response_invalid",
            Self::Failed => "failed",
            Self::NotFound => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
        }
    }
}

/// The final reply and how the request got there.
#[derive(Debug)]
pub struct Dispatched {
    /// The reply to send.
    pub reply: Reply,
    /// How the request ended.
    pub outcome: Outcome,
}

/// A bound endpoint with its composed hook chain, ready to serve requests.
///
/// Immutable after construction; one instance serves any number of
/// concurrent requests.
#[derive(Debug)]
pub struct BoundRoute {
    bound: BoundEndpoint,
    chain: HookChain,
    options: Arc<DispatchOptions>,
}

impl BoundRoute {
    /// Binds `bound` with the global hooks and options in `options`.
    #[must_use]
    pub fn new(bound: BoundEndpoint, options: Arc<DispatchOptions>) -> Self {
        let chain = HookChain::compose(&options.hooks, bound.entry().hooks());
        Self {
            bound,
            chain,
            options,
        }
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.bound.method()
    }

    /// Absolute path template.
    #[must_use]
    pub fn path(&self) -> &str {
        self.bound.path()
    }

    /// Dotted name of the contract leaf.
    #[must_use]
    pub fn name(&self) -> &str {
        self.bound.name()
    }

    /// The declared endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        self.bound.endpoint()
    }

    /// The composed hooks.
    #[must_use]
    pub const fn chain(&self) -> &HookChain {
        &self.chain
    }

    /// Runs `request` through the pipeline.
    ///
    /// `request.params` must already hold the extracted path parameters.
    pub async fn handle(&self, mut request: Request) -> Dispatched {
        request.route = self.path().to_string();
        let mut reply = Reply::new();

        let mut outcome = match self.run(&mut request, &mut reply).await {
            Ok(Some(phase)) => {
                hermes_telemetry::metrics::record_hook_short_circuit(phase.name());
                return Dispatched {
                    reply,
                    outcome: Outcome::ShortCircuited(phase),
                };
            }
            Ok(None) => Outcome::Completed,
            Err(error) => {
                if reply.is_sent() {
                    reply = Reply::new();
                }
                reply_error(&error, &request, &self.options, &mut reply);
                Outcome::of(&error)
            }
        };

        if let Err(source) = self.chain.run(Phase::OnSend, &mut request, &mut reply).await {
            let error = DispatchError::Hook {
                phase: Phase::OnSend,
                source,
            };
            reply = Reply::new();
            reply_error(&error, &request, &self.options, &mut reply);
            outcome = Outcome::Failed;
        }

        if let Err(error) = self.chain.run(Phase::OnResponse, &mut request, &mut reply).await {
            tracing::error!(
                request_id = %request.request_id,
                route = self.path(),
                error = %error,
                "onResponse hook failed"
            );
        }

        Dispatched { reply, outcome }
    }

    /// Runs everything up to the committed reply.
    ///
    /// Returns the phase of a short-circuiting hook, if any.
    async fn run(
        &self,
        request: &mut Request,
        reply: &mut Reply,
    ) -> Result<Option<Phase>, DispatchError> {
        for phase in [Phase::OnRequest, Phase::PreParsing] {
            if self.run_phase(phase, request, reply).await? {
                return Ok(Some(phase));
            }
        }

        let mut decode = DecodeIssues::default();
        request.query = query_value(request.uri.query(), self.options.json_query)
            .unwrap_or_else(|issue| {
                decode.query = Some(issue);
                Value::Object(serde_json::Map::new())
            });
        request.headers = headers_value(&request.raw_headers);
        request.body = body_value(&request.raw_headers, &request.raw_body).unwrap_or_else(|issue| {
            decode.body = Some(issue);
            Value::Null
        });

        if self.run_phase(Phase::PreValidation, request, reply).await? {
            return Ok(Some(Phase::PreValidation));
        }

        validate_request(self.endpoint(), request, &decode)?.apply(request);

        if self.run_phase(Phase::PreHandler, request, reply).await? {
            return Ok(Some(Phase::PreHandler));
        }

        let response = match self.bound.entry().handler().call(request.clone()).await {
            Ok(response) | Err(HandlerError::Response(response)) => response,
            Err(HandlerError::Internal(error)) => return Err(DispatchError::Handler(error)),
        };

        resolve_response(self.endpoint(), self.path(), response, &self.options, reply)?;
        Ok(None)
    }

    async fn run_phase(
        &self,
        phase: Phase,
        request: &mut Request,
        reply: &mut Reply,
    ) -> Result<bool, DispatchError> {
        self.chain
            .run(phase, request, reply)
            .await
            .map_err(|source| DispatchError::Hook { phase, source })
    }
}
