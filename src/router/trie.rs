//! Segment trie for one HTTP verb.
//!
//! Paths are split on `/` with empty segments discarded, so `/users/:id`,
//! `users/:id/` and `//users//:id` all address the same node. Each segment is
//! one of:
//!
//! - a literal (`users`), matched verbatim,
//! - a parameter (`:id`), binding exactly one request segment,
//! - a wildcard (`*`), honoured only directly under the root as a last-resort
//!   fallback.
//!
//! ## Matching quirks
//!
//! Two behaviours are kept on purpose and covered by tests:
//!
//! - **First parameter name wins.** All parameter segments at one position
//!   share a single node, named after the first route registered there.
//!   Registering `/users/:id` then `/users/:uid/posts` binds `id` for both.
//! - **No backtracking.** A literal child is always preferred over the
//!   parameter child, and a miss further down does not retry the parameter
//!   branch. With `/users/me/settings` and `/users/:id/posts` registered,
//!   `/users/me/posts` does not match.
//!
//! When the literal/parameter walk fails, the root wildcard (route `*`) is the
//! only fallback. A walk that ends on an existing node without handlers is a
//! miss and does not fall back.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::core::{ParamVec, RouteMatch};
use crate::handlers::Handler;

const WILDCARD: &str = "*";

pub(crate) fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// What a node matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Exact segment text. The root is `Literal("")`.
    Literal(Arc<str>),
    /// Named parameter capturing one segment
    Param(Arc<str>),
    Wildcard,
}

impl SegmentKind {
    fn pattern(&self) -> String {
        match self {
            SegmentKind::Literal(text) => text.to_string(),
            SegmentKind::Param(name) => format!(":{name}"),
            SegmentKind::Wildcard => WILDCARD.to_string(),
        }
    }
}

/// Node of a [`PathTrie`]
#[derive(Debug, Clone)]
pub struct RouteNode {
    kind: SegmentKind,
    literal_children: HashMap<Arc<str>, RouteNode>,
    param_child: Option<Box<RouteNode>>,
    wildcard_child: Option<Box<RouteNode>>,
    handlers: Vec<Handler>,
}

impl RouteNode {
    fn new(kind: SegmentKind) -> Self {
        Self {
            kind,
            literal_children: HashMap::new(),
            param_child: None,
            wildcard_child: None,
            handlers: Vec::new(),
        }
    }

    fn root() -> Self {
        Self::new(SegmentKind::Literal(Arc::from("")))
    }

    #[must_use]
    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    /// Handlers bound at exactly this path, in registration order
    #[must_use]
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    /// Child a request segment would descend into: the literal child for that
    /// exact text, else the parameter child.
    #[must_use]
    pub fn child(&self, segment: &str) -> Option<&RouteNode> {
        self.literal_children
            .get(segment)
            .or(self.param_child.as_deref())
    }

    /// Child node for a pattern segment, created on first use
    fn child_entry(&mut self, segment: &str) -> &mut RouteNode {
        if segment == WILDCARD {
            return self
                .wildcard_child
                .get_or_insert_with(|| Box::new(RouteNode::new(SegmentKind::Wildcard)));
        }
        if let Some(name) = segment.strip_prefix(':') {
            let child = self.param_child.get_or_insert_with(|| {
                Box::new(RouteNode::new(SegmentKind::Param(Arc::from(name))))
            });
            if let SegmentKind::Param(existing) = &child.kind {
                if existing.as_ref() != name {
                    warn!(
                        registered = %existing,
                        requested = %name,
                        "Parameter name differs from the one already registered at this position; keeping the original"
                    );
                }
            }
            return child;
        }
        self.literal_children
            .entry(Arc::from(segment))
            .or_insert_with(|| RouteNode::new(SegmentKind::Literal(Arc::from(segment))))
    }

    fn collect_patterns(&self, prefix: &str, out: &mut Vec<String>) {
        if !self.handlers.is_empty() {
            out.push(if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            });
        }
        let mut literals: Vec<&RouteNode> = self.literal_children.values().collect();
        literals.sort_by_cached_key(|node| node.kind.pattern());
        let children = literals
            .into_iter()
            .chain(self.param_child.as_deref())
            .chain(self.wildcard_child.as_deref());
        for child in children {
            let path = format!("{prefix}/{}", child.kind.pattern());
            child.collect_patterns(&path, out);
        }
    }

    fn route_count(&self) -> usize {
        let own = usize::from(!self.handlers.is_empty());
        own + self
            .literal_children
            .values()
            .chain(self.param_child.as_deref())
            .chain(self.wildcard_child.as_deref())
            .map(RouteNode::route_count)
            .sum::<usize>()
    }
}

/// Append-only segment trie holding the routes of one verb.
#[derive(Debug, Clone)]
pub struct PathTrie {
    root: RouteNode,
}

impl Default for PathTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTrie {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RouteNode::root(),
        }
    }

    /// Append `handler` to the node addressed by `path`, creating nodes as needed.
    ///
    /// Inserting at an identical path again accumulates handlers in call order;
    /// this is how a route's chain is composed.
    pub fn insert(&mut self, path: &str, handler: Handler) {
        let mut node = &mut self.root;
        for (depth, segment) in split_segments(path).enumerate() {
            if segment == WILDCARD && depth > 0 {
                warn!(
                    path = %path,
                    depth = depth,
                    "Wildcard below the root is never matched"
                );
            }
            node = node.child_entry(segment);
        }
        node.handlers.push(handler);
    }

    /// Resolve `path` to its handler chain and captured parameters.
    ///
    /// A miss yields a [`RouteMatch`] with no handlers and no parameters.
    #[must_use]
    pub fn find(&self, path: &str) -> RouteMatch {
        let mut params = ParamVec::new();
        let mut node = &self.root;

        for segment in split_segments(path) {
            if let Some(child) = node.literal_children.get(segment) {
                node = child;
            } else if let Some(child) = node.param_child.as_deref() {
                if let SegmentKind::Param(name) = &child.kind {
                    params.push((Arc::clone(name), segment.to_string()));
                }
                node = child;
            } else {
                return self.root_wildcard();
            }
        }

        if node.handlers.is_empty() {
            return RouteMatch::default();
        }
        RouteMatch {
            handlers: node.handlers.clone(),
            params,
        }
    }

    fn root_wildcard(&self) -> RouteMatch {
        match self.root.wildcard_child.as_deref() {
            Some(wildcard) if !wildcard.handlers.is_empty() => RouteMatch {
                handlers: wildcard.handlers.clone(),
                params: ParamVec::new(),
            },
            _ => RouteMatch::default(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &RouteNode {
        &self.root
    }

    /// True when no route has been inserted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count() == 0
    }

    /// Number of nodes carrying handlers
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.root.route_count()
    }

    /// Path pattern of every node carrying handlers, literals sorted per level,
    /// then the parameter branch, then the wildcard branch.
    #[must_use]
    pub fn patterns(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect_patterns("", &mut out);
        out
    }
}
