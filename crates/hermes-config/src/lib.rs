//! Typed configuration for Hermes services.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict parsing (unknown keys fail)
//! - Layered loading (defaults → file → env)
//!
//! [`HermesConfig`] holds four sections:
//!
//! - [`ServerSection`]: bind address, connection and body limits
//! - [`DispatchSection`]: the serialisable dispatch options
//! - [`LoggingSection`] and [`MetricsSection`]: telemetry
//!
//! # Configuration File Format
//!
//! ```toml
//! service_name = "blog"
//!
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! body_timeout_ms = 30000
//!
//! [dispatch]
//! response_validation = true
//! undeclared_status = "warn"
//! json_query = false
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! Every key can be overridden as `PREFIX__SECTION__KEY`:
//!
//! - `HERMES__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `HERMES__DISPATCH__RESPONSE_VALIDATION=true`
//! - `HERMES__METRICS__HISTOGRAM_BUCKETS=0.01,0.1,1`

#![doc(html_root_url = "https://docs.rs/hermes-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{HermesConfig, HermesConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{DispatchSection, LogFormat, LoggingSection, MetricsSection, ServerSection};
