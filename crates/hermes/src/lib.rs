//! # Hermes
//!
//! **Contract-driven HTTP request dispatcher**
//!
//! Describe an API as a tree of endpoint contracts, supply a handler tree
//! with the same shape, and Hermes binds the two:
//!
//! - **Congruence checked at start-up** - a missing or extra handler is a
//!   configuration error, never a runtime 404
//! - **Request validation** - path parameters, query, headers and body are
//!   validated, coerced and stripped before the handler runs
//! - **Response resolution** - declared statuses are validated and
//!   serialized per content type
//! - **Lifecycle hooks** - global hooks run before route hooks in every phase
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hermes::prelude::*;
//!
//! async fn ping(request: Request) -> HandlerResult {
//!     Ok(HandlerResponse::ok(&serde_json::json!({ "pong": request.body["ping"] })))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hermes::Error> {
//!     let contract: ContractNode = Group::new()
//!         .prefix("/v1")
//!         .leaf(
//!             "ping",
//!             Endpoint::post("/ping")
//!                 .body(Shape::object([("ping", Shape::string())]))
//!                 .response(StatusCode::OK, ResponseSpec::new(Shape::object([("pong", Shape::string())])))
//!                 .build(),
//!         )
//!         .into();
//!     let handlers: HandlerNode = Group::new().leaf("ping", handler(ping)).into();
//!
//!     let config = ConfigLoader::new().with_defaults().with_env_prefix("PING").load()?;
//!     App::new(contract, handlers).config(config).run().await
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! onRequest → preParsing → preValidation → validate → preHandler → handler
//!                                                                     ↓
//!                      onResponse ← send ← onSend ← resolve response ←┘
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;

pub use app::App;
pub use error::{Error, Result};

// Re-export core types
pub use hermes_core as core;

// Re-export router types
pub use hermes_router as router;

// Re-export dispatch types
pub use hermes_dispatch as dispatch;

// Re-export server types
pub use hermes_server as server;

// Re-export telemetry
pub use hermes_telemetry as telemetry;

// Re-export configuration
pub use hermes_config as config;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use hermes::prelude::*;
/// ```
pub mod prelude {
    pub use crate::App;

    // Contracts and handlers
    pub use hermes_core::{
        handler, ContractNode, DispatchOptions, Endpoint, Group, HandlerError, HandlerNode,
        HandlerResponse, HandlerResult, ResponseSpec, Shape, UndeclaredStatusPolicy,
    };

    // Hooks
    pub use hermes_core::{hook_async, hook_fn, HookError, Hooks, Phase, Reply, Request};

    // Dispatch
    pub use hermes_dispatch::{Dispatcher, Outcome};

    // Server and configuration
    pub use hermes_config::{ConfigLoader, HermesConfig};
    pub use hermes_server::{Server, ServerConfig, ShutdownSignal};

    pub use http::StatusCode;
}
