//! Captured path parameters.

use std::sync::Arc;

use smallvec::SmallVec;

/// Parameters captured by a route match, in template order.
///
/// Names are shared with the route table; only values are allocated per
/// match. Up to four pairs live inline.
///
/// ```rust
/// use hermes_router::Params;
///
/// let mut params = Params::new();
/// params.push("postId", "10");
///
/// assert_eq!(params.get("postId"), Some("10"));
/// assert_eq!(params.get("commentId"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    pairs: SmallVec<[(Arc<str>, String); 4]>,
}

impl Params {
    /// No parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured parameter.
    pub fn push(&mut self, name: impl Into<Arc<str>>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter()
            .find_map(|(candidate, value)| (candidate == name).then_some(value))
    }

    /// `true` for a route without parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// `(name, value)` pairs in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(name, value)| (&**name, value.as_str()))
    }
}

impl FromIterator<(Arc<str>, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (Arc<str>, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}
