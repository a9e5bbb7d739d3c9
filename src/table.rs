//! Ordered route table and the atomically swappable handle that publishes it.
//!
//! A [`RouteTable`] is built once, sorted by [`Route`] order, and never
//! mutated after publication. Live updates go through [`SharedRouteTable`]:
//! a new table is built off to the side and swapped in atomically, so every
//! in-flight request keeps the snapshot it started with and rebuilds never
//! block readers.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{info, warn};

use crate::docs::RouteCatalog;
use crate::route::Route;

/// Immutable, ordered, deduplicated collection of routes.
///
/// Order is the route order (template specificity, then method, then the
/// negotiation strings), which is exactly the order the match pipeline
/// scans. Two routes that compare equal collide; the first registrant wins
/// and the loser is dropped with a warning.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    #[must_use]
    pub fn from_routes(routes: impl IntoIterator<Item = Arc<Route>>) -> Self {
        let mut table = Self::new();
        for route in routes {
            table.insert(route);
        }
        table
    }

    /// Insert preserving order. Returns `false` when an equal route is
    /// already present; the existing registration is kept.
    pub fn insert(&mut self, route: Arc<Route>) -> bool {
        match self
            .routes
            .binary_search_by(|existing| existing.as_ref().cmp(route.as_ref()))
        {
            Ok(_) => {
                warn!(%route, "duplicate route registration ignored");
                false
            }
            Err(position) => {
                self.routes.insert(position, route);
                true
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[must_use]
    pub fn catalog(&self) -> RouteCatalog {
        RouteCatalog::describe(&self.routes)
    }
}

/// Cloneable handle to the currently published table.
///
/// Readers call [`SharedRouteTable::load`] once per request and resolve
/// against that snapshot; writers publish a replacement table whole.
#[derive(Debug, Clone)]
pub struct SharedRouteTable {
    inner: Arc<ArcSwap<RouteTable>>,
}

impl SharedRouteTable {
    #[must_use]
    pub fn new(table: RouteTable) -> Self {
        info!(routes = table.len(), "route table published");
        Self {
            inner: Arc::new(ArcSwap::from_pointee(table)),
        }
    }

    /// Current snapshot. The returned `Arc` stays valid across swaps.
    #[must_use]
    pub fn load(&self) -> Arc<RouteTable> {
        self.inner.load_full()
    }

    /// Atomically replace the published table.
    pub fn publish(&self, table: Arc<RouteTable>) {
        info!(routes = table.len(), "route table swapped");
        self.inner.store(table);
    }
}

impl Default for SharedRouteTable {
    fn default() -> Self {
        Self::new(RouteTable::new())
    }
}

/// Recomputes the route set on demand.
///
/// [`crate::service::RouterService::update_routes`] hands an implementation
/// the sharing handle and the snapshot that was current at trigger time; the
/// implementation builds a replacement table (possibly on its own thread)
/// and publishes it through the handle when ready.
pub trait DynamicRouteResolver: Send + Sync {
    fn update_routes(&self, shared: &SharedRouteTable, current: Arc<RouteTable>);
}
