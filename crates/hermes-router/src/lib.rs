//! Radix tree route table for Hermes.
//!
//! The dispatcher flattens a contract into `(method, path template)` pairs and
//! inserts each one here under a numeric [`RouteId`]. At request time the
//! router resolves the concrete path back to that id and the captured
//! parameters.
//!
//! # Features
//!
//! - **Radix Tree Matching**: lookup cost grows with path length, not route count
//! - **Path Parameters**: `:name` segments (`/posts/:postId`)
//! - **Wildcards**: catch-all tail segments (`/files/*path`)
//! - **404 vs 405**: [`Router::lookup`] reports which methods a path accepts
//!
//! # Example
//!
//! ```rust
//! use hermes_router::{Lookup, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(&Method::GET, "/posts", 0).unwrap();
//! router.insert(&Method::GET, "/posts/:postId", 1).unwrap();
//!
//! let found = router.match_route(&Method::GET, "/posts/10").unwrap();
//! assert_eq!(found.route_id, 1);
//! assert_eq!(found.params.get("postId"), Some("10"));
//!
//! assert!(matches!(router.lookup(&Method::DELETE, "/posts"), Lookup::MethodNotAllowed(_)));
//! ```

mod error;
mod method_router;
mod node;
mod params;
mod router;

pub use error::RouteError;
pub use method_router::{MethodRouter, Target};
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::Router;

use http::Method;

/// Identifier assigned to a route at insertion time.
pub type RouteId = usize;

/// A matched route with its identifier and extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The identifier passed to [`Router::insert`]
    pub route_id: RouteId,
    /// Extracted path parameters
    pub params: Params,
}

impl RouteMatch {
    /// Creates a new route match.
    #[must_use]
    pub fn new(route_id: RouteId, params: Params) -> Self {
        Self { route_id, params }
    }
}

/// Result of resolving a request against the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A route is bound for this method and path.
    Found(RouteMatch),
    /// The path exists but not for this method; carries the allowed methods.
    MethodNotAllowed(Vec<Method>),
    /// Nothing matches the path.
    NotFound,
}
