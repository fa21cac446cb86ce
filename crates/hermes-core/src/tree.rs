//! Recursive route trees.
//!
//! Both the contract and the handler map are a [`Tree`]: a leaf, or a named
//! group of subtrees with an optional path prefix. The two are walked
//! together by [`Tree::zip`], which is the only traversal either needs.

use indexmap::IndexMap;

/// A leaf value or a named group of subtrees.
#[derive(Debug, Clone)]
pub enum Tree<T> {
    /// A single entry (an endpoint or a handler).
    Leaf(T),
    /// A named set of children sharing an optional prefix.
    Group(Group<T>),
}

/// A named group of subtrees.
///
/// Children keep insertion order, which is also the order in which flattened
/// routes are produced.
///
/// # Example
///
/// ```
/// use hermes_core::tree::{Group, Tree};
///
/// let tree: Tree<u32> = Group::new()
///     .prefix("/v1")
///     .leaf("one", 1)
///     .group("nested", Group::new().leaf("two", 2))
///     .into();
///
/// assert_eq!(tree.leaf_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Group<T> {
    prefix: Option<String>,
    children: IndexMap<String, Tree<T>>,
}

impl<T> Default for Group<T> {
    fn default() -> Self {
        Self {
            prefix: None,
            children: IndexMap::new(),
        }
    }
}

impl<T> Group<T> {
    /// Creates an empty group with no prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path prefix applied to every descendant.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Adds a leaf child.
    #[must_use]
    pub fn leaf(self, name: impl Into<String>, value: T) -> Self {
        self.child(name, Tree::Leaf(value))
    }

    /// Adds a nested group.
    #[must_use]
    pub fn group(self, name: impl Into<String>, group: Group<T>) -> Self {
        self.child(name, Tree::Group(group))
    }

    /// Adds any subtree. A repeated name replaces the earlier child in place.
    #[must_use]
    pub fn child(mut self, name: impl Into<String>, tree: Tree<T>) -> Self {
        self.children.insert(name.into(), tree);
        self
    }

    /// Returns the prefix, if any.
    #[must_use]
    pub fn path_prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the child with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tree<T>> {
        self.children.get(name)
    }

    /// Iterates over children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Tree<T>)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if the group has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<T> From<Group<T>> for Tree<T> {
    fn from(group: Group<T>) -> Self {
        Self::Group(group)
    }
}

impl<T> Tree<T> {
    /// Wraps a single value as a tree.
    #[must_use]
    pub fn leaf(value: T) -> Self {
        Self::Leaf(value)
    }

    /// Returns a short name for the node kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Leaf(_) => "leaf",
            Self::Group(_) => "group",
        }
    }

    /// Counts the leaves below this node.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Group(group) => group.children.values().map(Tree::leaf_count).sum(),
        }
    }

    /// Walks `self` and `other` in lockstep and pairs up their leaves.
    ///
    /// Prefixes are taken from `self` only and concatenated from the root
    /// down. Every name must exist in both trees with the same node kind.
    pub fn zip<'a, U>(&'a self, other: &'a Tree<U>) -> Result<Vec<Paired<'a, T, U>>, Mismatch> {
        let mut out = Vec::with_capacity(self.leaf_count());
        let mut key_path = Vec::new();
        zip_into(self, other, String::new(), &mut key_path, &mut out)?;
        Ok(out)
    }
}

/// One pair of leaves produced by [`Tree::zip`].
#[derive(Debug)]
pub struct Paired<'a, T, U> {
    /// Names from the root to this leaf.
    pub key_path: Vec<String>,
    /// Concatenated prefixes of every ancestor group.
    pub prefix: String,
    /// Leaf from the left tree.
    pub left: &'a T,
    /// Leaf from the right tree.
    pub right: &'a U,
}

/// Structural difference found while zipping two trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Present on the left, absent on the right.
    MissingRight {
        /// Dotted key path of the node.
        key_path: String,
    },
    /// Present on the right, absent on the left.
    MissingLeft {
        /// Dotted key path of the node.
        key_path: String,
    },
    /// Present on both sides with different node kinds.
    Kind {
        /// Dotted key path of the node.
        key_path: String,
        /// Kind on the left.
        left: &'static str,
        /// Kind on the right.
        right: &'static str,
    },
}

fn dotted(key_path: &[String]) -> String {
    if key_path.is_empty() {
        "<root>".to_string()
    } else {
        key_path.join(".")
    }
}

fn zip_into<'a, T, U>(
    left: &'a Tree<T>,
    right: &'a Tree<U>,
    prefix: String,
    key_path: &mut Vec<String>,
    out: &mut Vec<Paired<'a, T, U>>,
) -> Result<(), Mismatch> {
    match (left, right) {
        (Tree::Leaf(l), Tree::Leaf(r)) => {
            out.push(Paired {
                key_path: key_path.clone(),
                prefix,
                left: l,
                right: r,
            });
            Ok(())
        }
        (Tree::Group(lg), Tree::Group(rg)) => {
            let prefix = match lg.path_prefix() {
                Some(p) => format!("{prefix}{p}"),
                None => prefix,
            };

            for (name, l_child) in &lg.children {
                key_path.push(name.clone());
                let Some(r_child) = rg.children.get(name) else {
                    return Err(Mismatch::MissingRight {
                        key_path: dotted(key_path),
                    });
                };
                zip_into(l_child, r_child, prefix.clone(), key_path, out)?;
                key_path.pop();
            }

            if let Some(extra) = rg.children.keys().find(|k| !lg.children.contains_key(*k)) {
                key_path.push(extra.clone());
                return Err(Mismatch::MissingLeft {
                    key_path: dotted(key_path),
                });
            }

            Ok(())
        }
        (l, r) => Err(Mismatch::Kind {
            key_path: dotted(key_path),
            left: l.kind(),
            right: r.kind(),
        }),
    }
}
