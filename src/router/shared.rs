use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use super::core::{MethodRegistry, RouteMatch};
use super::verb::Verb;
use crate::handlers::Handler;

/// Handle to a [`MethodRegistry`] that can change while requests are served.
///
/// Readers take a snapshot with [`load`](Self::load) and keep using it for the
/// whole request. Writers build a new registry off to the side and publish it
/// with one atomic swap, so a reader sees either the old or the new table and
/// never a partially linked node. Clones share the same table.
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<ArcSwap<MethodRegistry>>,
}

impl SharedRegistry {
    #[must_use]
    pub fn new(registry: MethodRegistry) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(registry)),
        }
    }

    /// Current snapshot
    #[must_use]
    pub fn load(&self) -> Arc<MethodRegistry> {
        self.inner.load_full()
    }

    /// Look up against the current snapshot
    #[must_use]
    pub fn lookup(&self, verb: Verb, path: &str) -> RouteMatch {
        self.inner.load().lookup(verb, path)
    }

    /// Copy-on-write registration. Concurrent writers are serialized by
    /// retrying against the latest snapshot.
    pub fn register_route<I>(&self, verb: Verb, path: &str, handlers: I)
    where
        I: IntoIterator<Item = Handler>,
    {
        let handlers: Vec<Handler> = handlers.into_iter().collect();
        self.inner.rcu(|current| {
            let mut next = MethodRegistry::clone(current);
            next.register_route(verb, path, handlers.iter().cloned());
            next
        });
        info!(
            method = %verb,
            path = %path,
            "Route published to live registry"
        );
    }

    /// Swap in a whole new routing table
    pub fn replace(&self, registry: MethodRegistry) {
        let routes_count = registry.route_count();
        self.inner.store(Arc::new(registry));
        info!(routes_count = routes_count, "Routing table replaced");
    }
}

impl Default for SharedRegistry {
    fn default() -> Self {
        Self::new(MethodRegistry::new())
    }
}

impl From<MethodRegistry> for SharedRegistry {
    fn from(registry: MethodRegistry) -> Self {
        Self::new(registry)
    }
}

impl std::fmt::Debug for SharedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRegistry")
            .field("routes", &self.inner.load().routes())
            .finish()
    }
}
