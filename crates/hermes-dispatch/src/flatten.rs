//! Tree flattening.
//!
//! Walks a contract tree and a handler tree in lockstep and produces one
//! [`BoundEndpoint`] per leaf pair, with group prefixes concatenated onto the
//! leaf's path template.

use std::collections::HashSet;

use hermes_core::{ConfigurationError, ContractNode, Endpoint, HandlerEntry, HandlerNode};
use http::Method;

/// An endpoint paired with its handler and absolute path.
#[derive(Debug, Clone)]
pub struct BoundEndpoint {
    name: String,
    path: String,
    endpoint: Endpoint,
    entry: HandlerEntry,
}

impl BoundEndpoint {
    /// Dotted key path of the leaf (e.g. `posts.getPost`), or `<root>`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.endpoint.method()
    }

    /// Absolute path template.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The declared endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The handler and its route-scoped hooks.
    #[must_use]
    pub const fn entry(&self) -> &HandlerEntry {
        &self.entry
    }
}

/// Flattens congruent contract and handler trees.
///
/// Endpoints come out in tree insertion order.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] if the trees differ in shape or if a
/// composed path is not a valid template.
pub fn flatten(
    contract: &ContractNode,
    handlers: &HandlerNode,
) -> Result<Vec<BoundEndpoint>, ConfigurationError> {
    contract
        .zip(handlers)?
        .into_iter()
        .map(|pair| -> Result<BoundEndpoint, ConfigurationError> {
            let path = format!("{}{}", pair.prefix, pair.left.path());
            check_path(&path)?;
            Ok(BoundEndpoint {
                name: if pair.key_path.is_empty() {
                    "<root>".to_string()
                } else {
                    pair.key_path.join(".")
                },
                path,
                endpoint: pair.left.clone(),
                entry: pair.right.clone(),
            })
        })
        .collect()
}

/// Checks that `path` is a well-formed template.
///
/// A template starts with `/`, has no empty inner segments, names every
/// `:param` with an identifier, binds each name once, and only allows a
/// `*wildcard` as its final segment.
///
/// # Errors
///
/// Returns [`ConfigurationError::MalformedPath`] or
/// [`ConfigurationError::DuplicateParam`].
pub fn check_path(path: &str) -> Result<(), ConfigurationError> {
    if path.is_empty() {
        return Err(ConfigurationError::malformed(path, "path is empty"));
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(ConfigurationError::malformed(path, "path must start with '/'"));
    };
    if path.contains("//") {
        return Err(ConfigurationError::malformed(path, "path contains an empty segment"));
    }

    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    let mut seen = HashSet::new();

    for (index, segment) in segments.iter().enumerate() {
        let name = if let Some(name) = segment.strip_prefix(':') {
            name
        } else if let Some(name) = segment.strip_prefix('*') {
            if index + 1 != segments.len() {
                return Err(ConfigurationError::malformed(
                    path,
                    "wildcard must be the last segment",
                ));
            }
            if name.is_empty() {
                continue;
            }
            name
        } else {
            continue;
        };

        if !is_identifier(name) {
            return Err(ConfigurationError::malformed(
                path,
                format!("invalid parameter name '{name}'"),
            ));
        }
        if !seen.insert(name) {
            return Err(ConfigurationError::DuplicateParam {
                route: path.to_string(),
                param: name.to_string(),
            });
        }
    }

    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
