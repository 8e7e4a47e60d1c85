//! Router core module - hot path for request routing.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]

use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::trie::PathTrie;
use super::verb::Verb;
use crate::handlers::Handler;

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Captured parameters in root-to-leaf order.
///
/// Names are `Arc<str>` shared with the trie; values are per-request text.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of looking up a request path.
///
/// An empty `handlers` list means "no route"; it is never signalled any other way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    /// Handler chain bound at the matched node, in registration order
    pub handlers: Vec<Handler>,
    /// Captured path parameters, root to leaf
    pub params: ParamVec,
}

impl RouteMatch {
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Get a path parameter by name
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert params to a HashMap.
    /// Note: This allocates - use get_param() in hot paths
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Routing table: one [`PathTrie`] per [`Verb`], created on first registration.
///
/// Built once before traffic starts and read-only afterwards. To change routes
/// while serving, wrap it in a [`SharedRegistry`](super::SharedRegistry).
///
/// ```rust
/// use acprouter::handlers::Handler;
/// use acprouter::router::{MethodRegistry, Verb};
/// use acprouter::server::HandlerResponse;
///
/// let show = Handler::terminal(|req| Ok(HandlerResponse::text(200, req.path.clone())));
/// let mut registry = MethodRegistry::new();
/// registry.get("/users/:id", [show.clone()]);
///
/// let m = registry.lookup(Verb::Get, "/users/123");
/// assert_eq!(m.handlers, vec![show]);
/// assert_eq!(m.get_param("id"), Some("123"));
/// assert!(registry.lookup(Verb::Post, "/users/123").is_not_found());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    tries: HashMap<Verb, PathTrie>,
}

impl MethodRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a route table; tuples are applied in order.
    pub fn from_routes<I, P>(routes: I) -> Self
    where
        I: IntoIterator<Item = (Verb, P, Handler)>,
        P: AsRef<str>,
    {
        let mut registry = Self::new();
        registry.extend(routes);
        let routes_summary: Vec<String> = registry
            .routes()
            .into_iter()
            .take(10)
            .map(|(verb, path)| format!("{verb} {path}"))
            .collect();
        info!(
            routes_count = registry.route_count(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );
        registry
    }

    /// Append each of `handlers` to the chain at (`verb`, `path`).
    pub fn register_route<I>(&mut self, verb: Verb, path: &str, handlers: I)
    where
        I: IntoIterator<Item = Handler>,
    {
        let trie = self.tries.entry(verb).or_default();
        let mut added = 0usize;
        for handler in handlers {
            trie.insert(path, handler);
            added += 1;
        }
        debug!(
            method = %verb,
            path = %path,
            handlers_added = added,
            "Route registered"
        );
    }

    pub fn extend<I, P>(&mut self, routes: I)
    where
        I: IntoIterator<Item = (Verb, P, Handler)>,
        P: AsRef<str>,
    {
        for (verb, path, handler) in routes {
            self.register_route(verb, path.as_ref(), [handler]);
        }
    }

    pub fn get<I: IntoIterator<Item = Handler>>(&mut self, path: &str, handlers: I) {
        self.register_route(Verb::Get, path, handlers);
    }

    pub fn post<I: IntoIterator<Item = Handler>>(&mut self, path: &str, handlers: I) {
        self.register_route(Verb::Post, path, handlers);
    }

    pub fn put<I: IntoIterator<Item = Handler>>(&mut self, path: &str, handlers: I) {
        self.register_route(Verb::Put, path, handlers);
    }

    pub fn patch<I: IntoIterator<Item = Handler>>(&mut self, path: &str, handlers: I) {
        self.register_route(Verb::Patch, path, handlers);
    }

    pub fn delete<I: IntoIterator<Item = Handler>>(&mut self, path: &str, handlers: I) {
        self.register_route(Verb::Delete, path, handlers);
    }

    pub fn options<I: IntoIterator<Item = Handler>>(&mut self, path: &str, handlers: I) {
        self.register_route(Verb::Options, path, handlers);
    }

    pub fn head<I: IntoIterator<Item = Handler>>(&mut self, path: &str, handlers: I) {
        self.register_route(Verb::Head, path, handlers);
    }

    /// Resolve (`verb`, `path`). Never mutates the registry; an unknown verb
    /// yields a not-found match.
    ///
    /// Misses and slow lookups are reported by the
    /// [`RequestDispatcher`](crate::dispatcher::RequestDispatcher), which knows
    /// the request ID and the configured threshold.
    #[must_use]
    pub fn lookup(&self, verb: Verb, path: &str) -> RouteMatch {
        let match_start = Instant::now();
        let result = self
            .tries
            .get(&verb)
            .map(|trie| trie.find(path))
            .unwrap_or_default();
        let match_duration = match_start.elapsed();

        if !result.is_not_found() {
            debug!(
                method = %verb,
                path = %path,
                handlers = result.handlers.len(),
                path_params = ?result.params,
                duration_us = match_duration.as_micros(),
                "Route matched"
            );
        }
        result
    }

    /// Trie for `verb`, if any route was registered under it
    #[must_use]
    pub fn trie(&self, verb: Verb) -> Option<&PathTrie> {
        self.tries.get(&verb)
    }

    /// Verbs with at least one registration, in [`Verb::ALL`] order
    #[must_use]
    pub fn verbs(&self) -> Vec<Verb> {
        Verb::ALL
            .into_iter()
            .filter(|verb| self.tries.contains_key(verb))
            .collect()
    }

    /// Every registered (verb, path pattern)
    #[must_use]
    pub fn routes(&self) -> Vec<(Verb, String)> {
        self.verbs()
            .into_iter()
            .filter_map(|verb| self.tries.get(&verb).map(|trie| (verb, trie)))
            .flat_map(|(verb, trie)| trie.patterns().into_iter().map(move |p| (verb, p)))
            .collect()
    }

    #[must_use]
    pub fn route_count(&self) -> usize {
        self.tries.values().map(PathTrie::route_count).sum()
    }
}
