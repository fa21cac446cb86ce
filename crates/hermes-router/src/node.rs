//! Radix tree node implementation.
//!
//! Every node represents one path segment. Parameter and wildcard children
//! are anonymous here; their names live on the [`Target`](crate::Target) of
//! each route so two routes may name the same position differently.

use percent_encoding::percent_decode_str;
use smallvec::SmallVec;

use crate::method_router::MethodRouter;

/// Captured parameter values in match order.
pub(crate) type Captures = SmallVec<[String; 4]>;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "posts", "v1")
    Static,
    /// Named parameter (e.g., ":postId")
    Param(String),
    /// Catch-all wildcard (e.g., "*path")
    Wildcard(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// The literal segment for static nodes, `:` or `*` otherwise
    pub segment: String,

    /// The kind of segment
    pub kind: SegmentKind,

    /// Methods bound at this node, if a route ends here
    pub methods: Option<MethodRouter>,

    /// Static children, sorted by segment for binary search
    pub static_children: Vec<Node>,

    /// Parameter child (at most one per node)
    pub param_child: Option<Box<Node>>,

    /// Wildcard child (at most one per node, always a leaf)
    pub wildcard_child: Option<Box<Node>>,
}

impl Node {
    /// Creates a new static node.
    #[must_use]
    pub fn new_static(segment: impl Into<String>) -> Self {
        Self::with_kind(segment.into(), SegmentKind::Static)
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new_static("")
    }

    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Splits a path template into typed segments.
    ///
    /// Empty segments are skipped so `/posts/` and `/posts` share a node.
    pub fn parse_path(path: &str) -> Result<Vec<(String, SegmentKind)>, String> {
        if !path.starts_with('/') {
            return Err("path must start with '/'".to_string());
        }

        let raw: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw.len());

        for (index, s) in raw.iter().enumerate() {
            if let Some(name) = s.strip_prefix(':') {
                if name.is_empty() {
                    return Err("parameter segment is missing a name".to_string());
                }
                segments.push(((*s).to_string(), SegmentKind::Param(name.to_string())));
            } else if let Some(name) = s.strip_prefix('*') {
                if index + 1 != raw.len() {
                    return Err("wildcard must be the last segment".to_string());
                }
                let name = if name.is_empty() { "*" } else { name };
                segments.push(((*s).to_string(), SegmentKind::Wildcard(name.to_string())));
            } else {
                segments.push(((*s).to_string(), SegmentKind::Static));
            }
        }

        Ok(segments)
    }

    /// Walks to (creating as needed) the node for `segments`.
    pub fn node_for(&mut self, segments: &[(String, SegmentKind)]) -> &mut Node {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            return self;
        };

        let child = match kind {
            SegmentKind::Static => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children
                            .insert(index, Node::new_static(segment.clone()));
                        index
                    }
                };
                &mut self.static_children[index]
            }
            SegmentKind::Param(_) => self
                .param_child
                .get_or_insert_with(|| Box::new(Node::with_kind(":".into(), kind.clone())))
                .as_mut(),
            SegmentKind::Wildcard(_) => self
                .wildcard_child
                .get_or_insert_with(|| Box::new(Node::with_kind("*".into(), kind.clone())))
                .as_mut(),
        };

        child.node_for(remaining)
    }

    /// Finds the deepest node that accepts `segments`, honouring route priority.
    ///
    /// `accept` decides whether a terminal node's method table is usable, which
    /// lets callers search for a specific method first and fall back to any.
    pub(crate) fn match_segments<'a, F>(
        &'a self,
        segments: &[&str],
        captures: &mut Captures,
        accept: &F,
    ) -> Option<&'a MethodRouter>
    where
        F: Fn(&MethodRouter) -> bool,
    {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref().filter(|m| accept(*m));
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, captures, accept) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            captures.push(decode(segment));
            if let Some(found) = child.match_segments(remaining, captures, accept) {
                return Some(found);
            }
            captures.pop();
        }

        if let Some(child) = &self.wildcard_child {
            if let Some(methods) = child.methods.as_ref().filter(|m| accept(*m)) {
                let rest: Vec<String> = segments.iter().map(|s| decode(s)).collect();
                captures.push(rest.join("/"));
                return Some(methods);
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn bind(root: &mut Node, path: &str, method: &Method, id: usize) {
        let segments = Node::parse_path(path).unwrap();
        root.node_for(&segments)
            .methods
            .get_or_insert_with(MethodRouter::new)
            .insert(method, id, Vec::new())
            .unwrap();
    }

    fn lookup(root: &Node, path: &str) -> Option<(usize, Vec<String>)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut captures = Captures::new();
        let accept = |m: &MethodRouter| m.contains(&Method::GET);
        root.match_segments(&segments, &mut captures, &accept)
            .and_then(|m| m.get(&Method::GET))
            .map(|t| (t.route_id, captures.into_vec()))
    }

    #[test]
    fn test_parse_path_static() {
        let segments = Node::parse_path("/v1/posts").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], ("v1".to_string(), SegmentKind::Static));
    }

    #[test]
    fn test_parse_path_param() {
        let segments = Node::parse_path("/posts/:postId").unwrap();
        assert_eq!(
            segments[1],
            (":postId".to_string(), SegmentKind::Param("postId".to_string()))
        );
    }

    #[test]
    fn test_parse_path_wildcard() {
        let segments = Node::parse_path("/files/*path").unwrap();
        assert_eq!(
            segments[1],
            ("*path".to_string(), SegmentKind::Wildcard("path".to_string()))
        );

        let anonymous = Node::parse_path("/files/*").unwrap();
        assert_eq!(anonymous[1].1, SegmentKind::Wildcard("*".to_string()));
    }

    #[test]
    fn test_parse_path_rejects_bad_templates() {
        assert!(Node::parse_path("posts").is_err());
        assert!(Node::parse_path("/posts/:").is_err());
        assert!(Node::parse_path("/files/*path/more").is_err());
    }

    #[test]
    fn test_parse_path_root() {
        assert!(Node::parse_path("/").unwrap().is_empty());
    }

    #[test]
    fn test_static_children_stay_sorted() {
        let mut root = Node::root();
        bind(&mut root, "/zeta", &Method::GET, 0);
        bind(&mut root, "/alpha", &Method::GET, 1);
        bind(&mut root, "/mid", &Method::GET, 2);

        let order: Vec<_> = root
            .static_children
            .iter()
            .map(|c| c.segment.as_str())
            .collect();
        assert_eq!(order, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_static_beats_param() {
        let mut root = Node::root();
        bind(&mut root, "/posts/:postId", &Method::GET, 0);
        bind(&mut root, "/posts/latest", &Method::GET, 1);

        assert_eq!(lookup(&root, "/posts/latest").unwrap().0, 1);
        assert_eq!(lookup(&root, "/posts/10"), Some((0, vec!["10".to_string()])));
    }

    #[test]
    fn test_param_backtracks_cleanly() {
        let mut root = Node::root();
        bind(&mut root, "/a/:x/c", &Method::GET, 0);
        bind(&mut root, "/a/*rest", &Method::GET, 1);

        // ":x" captures "b" first, fails on "d", and must not leak into the wildcard
        let (id, captures) = lookup(&root, "/a/b/d").unwrap();
        assert_eq!(id, 1);
        assert_eq!(captures, vec!["b/d".to_string()]);
    }

    #[test]
    fn test_param_values_are_percent_decoded() {
        let mut root = Node::root();
        bind(&mut root, "/users/:name", &Method::GET, 0);

        let (_, captures) = lookup(&root, "/users/john%20doe").unwrap();
        assert_eq!(captures, vec!["john doe".to_string()]);
    }
}
