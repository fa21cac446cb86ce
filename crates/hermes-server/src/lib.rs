//! # Hermes Server
//!
//! Serves a [`Dispatcher`](hermes_dispatch::Dispatcher) over HTTP/1.1.
//!
//! - Hyper connection loop on Tokio
//! - Request body size limit and timeout
//! - Built-in `/health` and `/metrics` endpoints
//! - Graceful shutdown on SIGTERM/SIGINT or a [`ShutdownSignal`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hermes_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Arc::new(build_dispatcher()?);
//!     Server::new(ServerConfig::default(), dispatcher).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod health;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::ServerError;
pub use health::{HealthCheck, HealthStatus};
pub use server::{HttpResponse, Server};
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownReceiver, ShutdownSignal};
