//! Dispatch binder.
//!
//! Flattens a contract and its handlers, composes hooks for every endpoint
//! and hands the resulting [`BoundRoute`]s to a [`RouteRegistrar`]. Binding
//! either succeeds for every endpoint or fails before any request is served.

use std::sync::Arc;

use hermes_core::{ConfigurationError, ContractNode, DispatchOptions, HandlerNode};

use crate::flatten::flatten;
use crate::pipeline::BoundRoute;

/// A routing facility that accepts bound routes.
pub trait RouteRegistrar {
    /// Registers one route.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the route cannot be registered,
    /// for example because its method and path are already taken.
    fn register(&mut self, route: Arc<BoundRoute>) -> Result<(), ConfigurationError>;
}

impl RouteRegistrar for Vec<Arc<BoundRoute>> {
    fn register(&mut self, route: Arc<BoundRoute>) -> Result<(), ConfigurationError> {
        self.push(route);
        Ok(())
    }
}

/// Flattens both trees and composes hooks for every endpoint.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] if the trees are not congruent or a
/// composed path is malformed.
pub fn compile(
    contract: &ContractNode,
    handlers: &HandlerNode,
    options: Arc<DispatchOptions>,
) -> Result<Vec<BoundRoute>, ConfigurationError> {
    Ok(flatten(contract, handlers)?
        .into_iter()
        .map(|bound| BoundRoute::new(bound, Arc::clone(&options)))
        .collect())
}

/// Compiles the contract and registers every route with `registrar`.
///
/// Returns the number of routes registered.
///
/// # Errors
///
/// Returns the first [`ConfigurationError`] from compilation or
/// registration.
pub fn bind<R>(
    contract: &ContractNode,
    handlers: &HandlerNode,
    options: DispatchOptions,
    registrar: &mut R,
) -> Result<usize, ConfigurationError>
where
    R: RouteRegistrar + ?Sized,
{
    let options = Arc::new(options);
    let routes = compile(contract, handlers, Arc::clone(&options))?;
    let count = routes.len();

    for route in routes {
        log_route(&route, options.log_initialization);
        registrar.register(Arc::new(route))?;
    }

    Ok(count)
}

fn log_route(route: &BoundRoute, verbose: bool) {
    let endpoint = route.endpoint();
    let summary = endpoint.summary().unwrap_or_default();
    if verbose {
        tracing::info!(
            method = %route.method(),
            path = route.path(),
            name = route.name(),
            hooks = route.chain().len(),
            deprecated = endpoint.is_deprecated(),
            summary,
            "route bound"
        );
    } else {
        tracing::debug!(
            method = %route.method(),
            path = route.path(),
            name = route.name(),
            "route bound"
        );
    }
    if endpoint.is_deprecated() {
        tracing::warn!(method = %route.method(), path = route.path(), "binding deprecated endpoint");
    }
}
