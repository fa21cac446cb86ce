//! HTTP method dispatch for a single path.
//!
//! A [`MethodRouter`] sits on every radix node that terminates a route and
//! maps each HTTP method to the route that was registered for it.

use std::sync::Arc;

use http::Method;

use crate::RouteId;

/// A route bound to one method on one path shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Identifier handed out at insertion time.
    pub route_id: RouteId,
    /// Parameter names in template order.
    pub param_names: Vec<Arc<str>>,
}

/// Maps HTTP methods to route targets for a single path.
///
/// # Example
///
/// ```rust
/// use hermes_router::MethodRouter;
/// use http::Method;
///
/// let mut methods = MethodRouter::new();
/// methods.insert(&Method::GET, 0, Vec::new()).unwrap();
///
/// assert_eq!(methods.get(&Method::GET).map(|t| t.route_id), Some(0));
/// assert!(methods.get(&Method::POST).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodRouter {
    get: Option<Target>,
    post: Option<Target>,
    put: Option<Target>,
    delete: Option<Target>,
    patch: Option<Target>,
    head: Option<Target>,
    options: Option<Target>,
    trace: Option<Target>,
    connect: Option<Target>,
    /// Extension methods, kept in insertion order.
    other: Vec<(Method, Target)>,
}

impl MethodRouter {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `method` to a route.
    ///
    /// Returns the already bound target as the error when the method is taken.
    pub fn insert(
        &mut self,
        method: &Method,
        route_id: RouteId,
        param_names: Vec<Arc<str>>,
    ) -> Result<(), Target> {
        let target = Target {
            route_id,
            param_names,
        };

        let slot = match *method {
            Method::GET => &mut self.get,
            Method::POST => &mut self.post,
            Method::PUT => &mut self.put,
            Method::DELETE => &mut self.delete,
            Method::PATCH => &mut self.patch,
            Method::HEAD => &mut self.head,
            Method::OPTIONS => &mut self.options,
            Method::TRACE => &mut self.trace,
            Method::CONNECT => &mut self.connect,
            _ => {
                if let Some((_, existing)) = self.other.iter().find(|(m, _)| m == method) {
                    return Err(existing.clone());
                }
                self.other.push((method.clone(), target));
                return Ok(());
            }
        };

        match slot {
            Some(existing) => Err(existing.clone()),
            None => {
                *slot = Some(target);
                Ok(())
            }
        }
    }

    /// Returns the target bound to `method`.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&Target> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            Method::HEAD => self.head.as_ref(),
            Method::OPTIONS => self.options.as_ref(),
            Method::TRACE => self.trace.as_ref(),
            Method::CONNECT => self.connect.as_ref(),
            _ => self
                .other
                .iter()
                .find(|(m, _)| m == method)
                .map(|(_, t)| t),
        }
    }

    /// Returns true if `method` is bound.
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        self.get(method).is_some()
    }

    /// Returns the bound methods, standard methods first.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        let standard = [
            (&self.get, Method::GET),
            (&self.post, Method::POST),
            (&self.put, Method::PUT),
            (&self.delete, Method::DELETE),
            (&self.patch, Method::PATCH),
            (&self.head, Method::HEAD),
            (&self.options, Method::OPTIONS),
            (&self.trace, Method::TRACE),
            (&self.connect, Method::CONNECT),
        ];

        standard
            .into_iter()
            .filter(|(slot, _)| slot.is_some())
            .map(|(_, m)| m)
            .chain(self.other.iter().map(|(m, _)| m.clone()))
            .collect()
    }

    /// Returns true if no method is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed_methods().is_empty()
    }
}
