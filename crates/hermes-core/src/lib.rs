//! # Hermes Core
//!
//! Core types for the Hermes contract-driven dispatcher.
//!
//! - [`tree`]: the recursive [`Tree`] shared by contracts and handler maps
//! - [`contract`]: [`Endpoint`] and [`ResponseSpec`] declarations
//! - [`schema`] and [`shape`]: the [`Schema`] interface and the built-in [`Shape`]
//! - [`handler`] and [`hooks`]: user code run for each request
//! - [`Request`] / [`Reply`]: per-request state
//! - [`error`]: the error taxonomy
//! - [`DispatchOptions`]: every recognized dispatch option

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod contract;
pub mod error;
pub mod handler;
pub mod hooks;
mod options;
mod reply;
mod request;
pub mod schema;
pub mod shape;
pub mod tree;

pub use contract::{ContractNode, Endpoint, EndpointBuilder, ResponseSpec};
pub use error::{
    ConfigurationError, DispatchError, ErrorCategory, ErrorEnvelope, Location,
    RequestValidationError, ResponseValidationError,
};
pub use handler::{
    handler, BoxFuture, Handler, HandlerEntry, HandlerError, HandlerNode, HandlerResponse,
    HandlerResult, ResponseBody,
};
pub use hooks::{hook_async, hook_callback, hook_fn, Done, Hook, HookError, HookRef, Hooks, Phase};
pub use options::{
    DispatchOptions, ErrorHandler, RequestValidationErrorHandler, UndeclaredStatusPolicy,
};
pub use reply::{Reply, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
pub use request::{Request, RequestId};
pub use schema::{Issue, IssueCode, PathItem, Schema, SchemaRef};
pub use shape::Shape;
pub use tree::{Group, Tree};
