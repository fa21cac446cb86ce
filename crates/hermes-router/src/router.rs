//! High-level router API.

use std::collections::HashSet;
use std::sync::Arc;

use http::Method;

use crate::error::RouteError;
use crate::method_router::{MethodRouter, Target};
use crate::node::{Captures, Node, SegmentKind};
use crate::params::Params;
use crate::{Lookup, RouteId, RouteMatch};

/// A radix tree router mapping `(method, path)` to route identifiers.
///
/// # Example
///
/// ```rust
/// use hermes_router::Router;
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(&Method::GET, "/v1/posts/:postId", 0).unwrap();
///
/// let found = router.match_route(&Method::GET, "/v1/posts/10").unwrap();
/// assert_eq!(found.route_id, 0);
/// assert_eq!(found.params.get("postId"), Some("10"));
/// ```
///
/// # Route Priority
///
/// 1. **Static segments** (e.g., `/posts/latest`)
/// 2. **Parameter segments** (e.g., `/posts/:postId`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
#[derive(Debug, Clone)]
pub struct Router {
    root: Node,
    route_count: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts a route.
    ///
    /// Two templates that differ only in parameter names (`/posts/:id` and
    /// `/posts/:postId`) occupy the same slot and conflict for the same method.
    pub fn insert(&mut self, method: &Method, path: &str, route_id: RouteId) -> Result<(), RouteError> {
        let segments =
            Node::parse_path(path).map_err(|reason| RouteError::malformed(path, reason))?;

        let mut seen = HashSet::new();
        let mut param_names = Vec::new();
        for (_, kind) in &segments {
            if let SegmentKind::Param(name) | SegmentKind::Wildcard(name) = kind {
                if !seen.insert(name.as_str()) {
                    return Err(RouteError::malformed(
                        path,
                        format!("parameter '{name}' appears more than once"),
                    ));
                }
                param_names.push(Arc::from(name.as_str()));
            }
        }

        self.root
            .node_for(&segments)
            .methods
            .get_or_insert_with(MethodRouter::new)
            .insert(method, route_id, param_names)
            .map_err(|_| RouteError::Duplicate {
                method: method.clone(),
                path: path.to_string(),
            })?;

        self.route_count += 1;
        Ok(())
    }

    /// Matches a method and concrete path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        match self.lookup(method, path) {
            Lookup::Found(found) => Some(found),
            Lookup::MethodNotAllowed(_) | Lookup::NotFound => None,
        }
    }

    /// Resolves a request, telling a missing path apart from a missing method.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut captures = Captures::new();
        let for_method = |m: &MethodRouter| m.contains(method);
        if let Some(methods) = self.root.match_segments(&segments, &mut captures, &for_method) {
            if let Some(target) = methods.get(method) {
                return Lookup::Found(Self::build_match(target, captures));
            }
        }

        let mut captures = Captures::new();
        let any = |m: &MethodRouter| !m.is_empty();
        match self.root.match_segments(&segments, &mut captures, &any) {
            Some(methods) => Lookup::MethodNotAllowed(methods.allowed_methods()),
            None => Lookup::NotFound,
        }
    }

    fn build_match(target: &Target, captures: Captures) -> RouteMatch {
        let params = target
            .param_names
            .iter()
            .cloned()
            .zip(captures)
            .collect::<Params>();
        RouteMatch::new(target.route_id, params)
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
