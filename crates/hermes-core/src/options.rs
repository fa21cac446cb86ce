//! Dispatch options.
//!
//! [`DispatchOptions`] enumerates every option the dispatcher recognizes.
//! Each field has a documented default; there is no free-form map.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, RequestValidationError};
use crate::hooks::Hooks;
use crate::reply::Reply;
use crate::request::Request;

/// Custom handler for request validation failures.
///
/// Receives the failing locations and may write any reply. If it leaves the
/// reply unsent, the default 400 body is used.
pub type RequestValidationErrorHandler =
    Arc<dyn Fn(&RequestValidationError, &Request, &mut Reply) + Send + Sync>;

/// Custom handler for every other per-request failure.
///
/// If it leaves the reply unsent, the default error envelope is used.
pub type ErrorHandler = Arc<dyn Fn(&DispatchError, &Request, &mut Reply) + Send + Sync>;

/// What to do when a handler returns a status its endpoint does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndeclaredStatusPolicy {
    /// Send the body unvalidated and log a warning.
    #[default]
    Warn,
    /// Treat the response as invalid.
    Reject,
}

/// Options applied to every bound endpoint.
#[derive(Clone)]
pub struct DispatchOptions {
    /// Validate and strip responses against their declared schema.
    ///
    /// Default: `false`.
    pub response_validation: bool,

    /// Override for the default 400 reply.
    ///
    /// Default: `None`.
    pub request_validation_error_handler: Option<RequestValidationErrorHandler>,

    /// Override for the default error envelope.
    ///
    /// Default: `None`.
    pub error_handler: Option<ErrorHandler>,

    /// Global hooks, run before route hooks in each phase.
    ///
    /// Default: empty.
    pub hooks: Hooks,

    /// Policy for undeclared response statuses.
    ///
    /// Default: [`UndeclaredStatusPolicy::Warn`].
    pub undeclared_status: UndeclaredStatusPolicy,

    /// Parse query values as JSON where possible.
    ///
    /// Default: `false`.
    pub json_query: bool,

    /// Log every bound route at `info` during registration.
    ///
    /// Default: `false`.
    pub log_initialization: bool,

    /// Reuse a valid UUID from an incoming `x-request-id` header instead of
    /// generating one.
    ///
    /// Default: `false`.
    pub trust_request_id: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            response_validation: false,
            request_validation_error_handler: None,
            error_handler: None,
            hooks: Hooks::new(),
            undeclared_status: UndeclaredStatusPolicy::Warn,
            json_query: false,
            log_initialization: false,
            trust_request_id: false,
        }
    }
}

impl DispatchOptions {
    /// Creates options with every default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables response validation.
    #[must_use]
    pub const fn response_validation(mut self, enabled: bool) -> Self {
        self.response_validation = enabled;
        self
    }

    /// Sets the request validation error handler.
    #[must_use]
    pub fn on_request_validation_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RequestValidationError, &Request, &mut Reply) + Send + Sync + 'static,
    {
        self.request_validation_error_handler = Some(Arc::new(handler));
        self
    }

    /// Sets the generic error handler.
    #[must_use]
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&DispatchError, &Request, &mut Reply) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Sets the global hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sets the undeclared status policy.
    #[must_use]
    pub const fn undeclared_status(mut self, policy: UndeclaredStatusPolicy) -> Self {
        self.undeclared_status = policy;
        self
    }

    /// Enables or disables JSON query parsing.
    #[must_use]
    pub const fn json_query(mut self, enabled: bool) -> Self {
        self.json_query = enabled;
        self
    }

    /// Enables or disables route logging at registration.
    #[must_use]
    pub const fn log_initialization(mut self, enabled: bool) -> Self {
        self.log_initialization = enabled;
        self
    }

    /// Enables or disables reuse of incoming request IDs.
    #[must_use]
    pub const fn trust_request_id(mut self, enabled: bool) -> Self {
        self.trust_request_id = enabled;
        self
    }
}

impl fmt::Debug for DispatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchOptions")
            .field("response_validation", &self.response_validation)
            .field(
                "request_validation_error_handler",
                &self.request_validation_error_handler.is_some(),
            )
            .field("error_handler", &self.error_handler.is_some())
            .field("hooks", &self.hooks)
            .field("undeclared_status", &self.undeclared_status)
            .field("json_query", &self.json_query)
            .field("log_initialization", &self.log_initialization)
            .field("trust_request_id", &self.trust_request_id)
            .finish()
    }
}
