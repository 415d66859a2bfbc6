//! Ordered route collection and selection strategies.
//!
//! # Responsibilities
//! - Hold routes in insertion order
//! - Select a route by first, last, best, next (round-robin) or random scan
//!
//! # Design Decisions
//! - Copy-on-write: attach/detach swap in a new snapshot, scans read one
//!   snapshot lock-free and never observe a partial update
//! - The round-robin cursor advances exactly once per `get_next` call

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use rand::Rng;

use crate::http::{Request, Response};
use crate::routing::handler::Handler;
use crate::routing::route::Route;

pub struct RouteList {
    routes: ArcSwap<Vec<Arc<Route>>>,
    cursor: AtomicUsize,
}

impl Default for RouteList {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteList {
    pub fn new() -> Self {
        Self {
            routes: ArcSwap::from_pointee(Vec::new()),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Current snapshot of the routes.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Route>>> {
        self.routes.load_full()
    }

    pub fn len(&self) -> usize {
        self.routes.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.load().is_empty()
    }

    /// Round-robin cursor value.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    pub fn push(&self, route: Arc<Route>) {
        self.routes.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(route.clone());
            next
        });
    }

    /// Remove every route targeting `handler`. Returns the number removed.
    pub fn remove_target(&self, handler: &Arc<dyn Handler>) -> usize {
        let mut removed = 0;
        self.routes.rcu(|current| {
            let next: Vec<_> = current.iter().filter(|r| !r.targets(handler)).cloned().collect();
            removed = current.len() - next.len();
            next
        });
        removed
    }

    /// Remove `route` by identity. Returns whether it was present.
    pub fn remove(&self, route: &Arc<Route>) -> bool {
        let mut removed = false;
        self.routes.rcu(|current| {
            let next: Vec<_> = current.iter().filter(|r| !Arc::ptr_eq(r, route)).cloned().collect();
            removed = next.len() != current.len();
            next
        });
        removed
    }

    /// First route scoring at least `required`.
    pub fn get_first(&self, request: &Request, response: &Response, required: f32) -> Option<Arc<Route>> {
        self.routes
            .load()
            .iter()
            .find(|r| r.score(request, response, required) >= required)
            .cloned()
    }

    /// Last route scoring at least `required`.
    pub fn get_last(&self, request: &Request, response: &Response, required: f32) -> Option<Arc<Route>> {
        self.routes
            .load()
            .iter()
            .rev()
            .find(|r| r.score(request, response, required) >= required)
            .cloned()
    }

    /// Highest scoring route at least `required`. Ties go to the earliest route.
    pub fn get_best(&self, request: &Request, response: &Response, required: f32) -> Option<Arc<Route>> {
        let routes = self.routes.load();
        let mut best: Option<(&Arc<Route>, f32)> = None;
        for route in routes.iter() {
            let score = route.score(request, response, required);
            if score >= required && best.map_or(true, |(_, top)| score > top) {
                best = Some((route, score));
            }
        }
        best.map(|(route, _)| route.clone())
    }

    /// Round-robin: scan from the cursor, wrapping once around the list.
    pub fn get_next(&self, request: &Request, response: &Response, required: f32) -> Option<Arc<Route>> {
        let start = self.cursor.fetch_add(1, Ordering::Relaxed);
        let routes = self.routes.load();
        scan_from(&routes, start, request, response, required)
    }

    /// Scan from a random index, wrapping once around the list.
    ///
    /// Routes following a run of non-qualifying routes are picked more often
    /// than the others.
    pub fn get_random(&self, request: &Request, response: &Response, required: f32) -> Option<Arc<Route>> {
        let routes = self.routes.load();
        if routes.is_empty() {
            return None;
        }
        let start = rand::thread_rng().gen_range(0..routes.len());
        scan_from(&routes, start, request, response, required)
    }
}

fn scan_from(
    routes: &[Arc<Route>],
    start: usize,
    request: &Request,
    response: &Response,
    required: f32,
) -> Option<Arc<Route>> {
    let len = routes.len();
    (0..len)
        .map(|i| &routes[start.wrapping_add(i) % len])
        .find(|r| r.score(request, response, required) >= required)
        .cloned()
}
