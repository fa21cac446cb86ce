//! # Hermes Dispatch
//!
//! Turns a contract tree and a mirroring handler tree into a running
//! dispatcher.
//!
//! ## Registration
//!
//! ```text
//! ContractNode ─┐
//!               ├─ flatten ─→ BoundEndpoint ─ HookChain::compose ─→ BoundRoute ─ bind ─→ Router
//! HandlerNode ──┘
//! ```
//!
//! ## Request time
//!
//! | Step | Module | Purpose |
//! |------|--------|---------|
//! | 1 | [`dispatcher`] | Route lookup, request ID, 404/405 |
//! | 2 | [`chain`] | `onRequest`, `preParsing` hooks |
//! | 3 | [`input`] | Query, header and body conversion |
//! | 4 | [`chain`] | `preValidation` hooks |
//! | 5 | [`validation`] | All four input locations, reported together |
//! | 6 | [`chain`] | `preHandler` hooks |
//! | 7 | [`pipeline`] | Handler |
//! | 8 | [`resolve`] | Status, content type, response validation |
//! | 9 | [`failure`] | Error replies for any failure above |
//! | 10 | [`chain`] | `onSend`, `onResponse` hooks |
//!
//! ## Example
//!
//! ```rust,ignore
//! use hermes_core::{handler, Endpoint, Group, Shape};
//! use hermes_dispatch::Dispatcher;
//!
//! let contract = Group::new()
//!     .prefix("/v1")
//!     .leaf("ping", Endpoint::post("/ping")
//!         .body(Shape::object([("ping", Shape::string())]))
//!         .build());
//! let handlers = Group::new().leaf("ping", handler(ping));
//!
//! let dispatcher = Dispatcher::new(contract.into(), handlers.into(), Default::default())?;
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-dispatch/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod binder;
pub mod chain;
pub mod dispatcher;
pub mod failure;
pub mod flatten;
pub mod input;
pub mod pipeline;
pub mod resolve;
pub mod validation;

pub use binder::{bind, compile, RouteRegistrar};
pub use chain::HookChain;
pub use dispatcher::{Dispatcher, DispatcherBuilder, REQUEST_ID_HEADER};
pub use failure::{issue_count, reply_error, reply_request_invalid};
pub use flatten::{check_path, flatten, BoundEndpoint};
pub use pipeline::{BoundRoute, Dispatched, Outcome};
pub use resolve::resolve_response;
pub use validation::{
    validate_location, validate_request, DecodeIssues, ValidatedRequest, ValidationOutcome,
};
