//! Router: selects a route for each request and dispatches to its target.
//!
//! # Responsibilities
//! - Attach and detach routes, including a fallback default route
//! - Select a route per routing mode, retrying with a delay when configured
//! - Start and stop route targets that have lifecycle hooks
//!
//! # Design Decisions
//! - Settings are one atomically swapped snapshot read once per dispatch
//! - No match is not an error: the response gets a 404
//! - The retry wait is an async sleep that `interrupt()` and `stop()` abort

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};
use async_trait::async_trait;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::RouterConfig;
use crate::http::{RedirectHandler, Request, Response};
use crate::lifecycle::{Lifecycle, LifecycleState, Signal};
use crate::observability::metrics;
use crate::routing::error::{HandlerError, RoutingError, RoutingResult};
use crate::routing::handler::Handler;
use crate::routing::matcher::Scorer;
use crate::routing::route::{Disposition, Route};
use crate::routing::route_list::RouteList;
use crate::routing::template::{MatchingMode, Template};

/// How a route is chosen among those scoring at least the required score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// Highest score; ties go to the earliest route.
    Best,
    /// First qualifying route in attachment order.
    #[default]
    First,
    /// Last qualifying route in attachment order.
    Last,
    /// Round-robin over the qualifying routes.
    Next,
    /// Qualifying route found from a random starting point.
    Random,
    /// Delegate to the router's custom selector.
    Custom,
}

/// Selection hook used in [`RoutingMode::Custom`].
pub trait CustomSelector: Send + Sync {
    fn select(&self, routes: &RouteList, request: &Request, response: &Response) -> Option<Arc<Route>>;
}

impl<F> CustomSelector for F
where
    F: Fn(&RouteList, &Request, &Response) -> Option<Arc<Route>> + Send + Sync,
{
    fn select(&self, routes: &RouteList, request: &Request, response: &Response) -> Option<Arc<Route>> {
        self(routes, request, response)
    }
}

pub struct Router {
    routes: RouteList,
    default_route: ArcSwapOption<Route>,
    settings: ArcSwap<RouterConfig>,
    custom_selector: ArcSwapOption<Box<dyn CustomSelector>>,
    state: AtomicU8,
    transition: Mutex<()>,
    interrupt: Signal,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::with_settings(RouterConfig::default())
    }

    /// Router with validated settings.
    pub fn from_config(config: RouterConfig) -> RoutingResult<Self> {
        check_required_score(config.required_score)?;
        check_max_attempts(config.max_attempts)?;
        Ok(Self::with_settings(config))
    }

    fn with_settings(settings: RouterConfig) -> Self {
        Self {
            routes: RouteList::new(),
            default_route: ArcSwapOption::empty(),
            settings: ArcSwap::from_pointee(settings),
            custom_selector: ArcSwapOption::empty(),
            state: AtomicU8::new(LifecycleState::Idle as u8),
            transition: Mutex::new(()),
            interrupt: Signal::new(),
        }
    }

    pub fn routes(&self) -> &RouteList {
        &self.routes
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> Arc<RouterConfig> {
        self.settings.load_full()
    }

    pub fn default_route(&self) -> Option<Arc<Route>> {
        self.default_route.load_full()
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from(self.state.load(Ordering::Acquire))
    }

    // Attaching

    /// Attach `target` under a URI template. The matching mode is the
    /// target's preferred one, or the router's default matching mode.
    pub fn attach(&self, pattern: &str, target: Arc<dyn Handler>) -> RoutingResult<Arc<Route>> {
        let mode = target
            .preferred_matching_mode()
            .unwrap_or(self.settings.load().default_matching_mode);
        self.attach_with_mode(pattern, target, mode)
    }

    pub fn attach_with_mode(&self, pattern: &str, target: Arc<dyn Handler>, mode: MatchingMode) -> RoutingResult<Arc<Route>> {
        let template = Template::builder(pattern).matching_mode(mode).build()?;
        Ok(self.attach_template(template, target))
    }

    /// Attach with a preconfigured template, e.g. one with typed variables.
    pub fn attach_template(&self, template: Template, target: Arc<dyn Handler>) -> Arc<Route> {
        self.push(Route::new(template, target))
    }

    /// Attach a route scored by `scorer` instead of a template.
    pub fn attach_scorer(&self, scorer: impl Scorer + 'static, target: Arc<dyn Handler>) -> Arc<Route> {
        self.push(Route::with_scorer(scorer, target))
    }

    fn push(&self, route: Route) -> Arc<Route> {
        route.set_matching_query(self.settings.load().default_matching_query);
        let route = Arc::new(route);
        self.routes.push(route.clone());
        tracing::debug!(route = ?route, "Route attached");
        route
    }

    /// Set the route used when no attached route qualifies. It matches any
    /// remaining path without consuming it.
    pub fn attach_default(&self, target: Arc<dyn Handler>) -> RoutingResult<Arc<Route>> {
        let template = Template::builder("").matching_mode(MatchingMode::StartsWith).build()?;
        let route = Arc::new(Route::new(template, target));
        route.set_matching_query(self.settings.load().default_matching_query);
        self.default_route.store(Some(route.clone()));
        tracing::debug!(route = ?route, "Default route attached");
        Ok(route)
    }

    /// Remove every route targeting `target`, the default route included.
    /// Returns the number of routes removed.
    pub fn detach(&self, target: &Arc<dyn Handler>) -> usize {
        let mut removed = self.routes.remove_target(target);
        let mut default_removed = false;
        self.default_route.rcu(|current| match current {
            Some(route) if route.targets(target) => {
                default_removed = true;
                None
            }
            other => {
                default_removed = false;
                other.clone()
            }
        });
        if default_removed {
            removed += 1;
        }
        tracing::debug!(handler = %target.name(), removed, "Target detached");
        removed
    }

    /// Remove one route by identity.
    pub fn detach_route(&self, route: &Arc<Route>) -> bool {
        self.routes.remove(route)
    }

    // Redirects

    /// Redirect requests matching `pattern` to `location` with a 301.
    /// Variables of `location` are filled from the request attributes,
    /// so `/old/{id}` can redirect to `/new/{id}`.
    pub fn redirect_permanent(&self, pattern: &str, location: &str) -> RoutingResult<Arc<Route>> {
        self.attach(pattern, Arc::new(RedirectHandler::permanent(location)?))
    }

    /// Redirect with a 303, telling the client to follow up with a GET.
    pub fn redirect_see_other(&self, pattern: &str, location: &str) -> RoutingResult<Arc<Route>> {
        self.attach(pattern, Arc::new(RedirectHandler::see_other(location)?))
    }

    /// Redirect with a 307, preserving the request method.
    pub fn redirect_temporary(&self, pattern: &str, location: &str) -> RoutingResult<Arc<Route>> {
        self.attach(pattern, Arc::new(RedirectHandler::temporary(location)?))
    }

    // Settings

    pub fn set_routing_mode(&self, mode: RoutingMode) {
        self.update(|s| s.routing_mode = mode);
    }

    pub fn set_required_score(&self, score: f32) -> RoutingResult<()> {
        check_required_score(score)?;
        self.update(|s| s.required_score = score);
        Ok(())
    }

    pub fn set_max_attempts(&self, attempts: u32) -> RoutingResult<()> {
        check_max_attempts(attempts)?;
        self.update(|s| s.max_attempts = attempts);
        Ok(())
    }

    pub fn set_retry_delay(&self, delay: Duration) {
        self.update(|s| s.retry_delay = delay);
    }

    /// Matching mode for routes attached afterwards without an explicit one.
    pub fn set_default_matching_mode(&self, mode: MatchingMode) {
        self.update(|s| s.default_matching_mode = mode);
    }

    /// Query matching flag for routes attached afterwards.
    pub fn set_default_matching_query(&self, matching_query: bool) {
        self.update(|s| s.default_matching_query = matching_query);
    }

    pub fn set_custom_selector(&self, selector: impl CustomSelector + 'static) {
        let selector: Box<dyn CustomSelector> = Box::new(selector);
        self.custom_selector.store(Some(Arc::new(selector)));
    }

    fn update(&self, apply: impl Fn(&mut RouterConfig)) {
        self.settings.rcu(|current| {
            let mut next = RouterConfig::clone(current);
            apply(&mut next);
            next
        });
    }

    // Dispatch

    /// Abort every dispatch currently waiting between attempts.
    pub fn interrupt(&self) {
        self.interrupt.trigger();
    }

    /// Select the route for `request`, falling back to the default route.
    /// Sets a 404 on `response` and returns `None` when nothing qualifies.
    pub async fn get_next(&self, request: &Request, response: &mut Response) -> RoutingResult<Option<Arc<Route>>> {
        let settings = self.settings.load_full();
        let required = settings.required_score;
        let mut interrupt = (settings.max_attempts > 1).then(|| self.interrupt.subscribe());

        let mut attempt = 0u32;
        let selected = loop {
            if attempt > 0 {
                metrics::record_retry();
                if let Some(rx) = interrupt.as_mut() {
                    tokio::select! {
                        _ = tokio::time::sleep(settings.retry_delay) => {}
                        _ = rx.recv() => {
                            tracing::warn!(path = %request.path(), attempt, "Routing interrupted while waiting to retry");
                            metrics::record_dispatch("interrupted");
                            return Err(RoutingError::Interrupted);
                        }
                    }
                }
            }
            let candidate = self.select(settings.routing_mode, request, response, required);
            attempt += 1;
            if candidate.is_some() || attempt >= settings.max_attempts {
                break candidate;
            }
        };
        metrics::record_attempts(attempt);

        if selected.is_some() {
            metrics::record_dispatch("matched");
            return Ok(selected);
        }

        if let Some(default) = self.default_route.load_full() {
            if default.score(request, response, required) >= required {
                metrics::record_dispatch("default");
                return Ok(Some(default));
            }
        }

        tracing::debug!(path = %request.path(), attempts = attempt, "No route matched");
        metrics::record_dispatch("not_found");
        response.set_status(StatusCode::NOT_FOUND);
        Ok(None)
    }

    fn select(&self, mode: RoutingMode, request: &Request, response: &Response, required: f32) -> Option<Arc<Route>> {
        match mode {
            RoutingMode::Best => self.routes.get_best(request, response, required),
            RoutingMode::First => self.routes.get_first(request, response, required),
            RoutingMode::Last => self.routes.get_last(request, response, required),
            RoutingMode::Next => self.routes.get_next(request, response, required),
            RoutingMode::Random => self.routes.get_random(request, response, required),
            RoutingMode::Custom => self
                .custom_selector
                .load_full()
                .and_then(|selector| selector.select(&self.routes, request, response)),
        }
    }

    /// Route `request` and invoke the selected target.
    pub async fn handle(&self, request: &mut Request, response: &mut Response) -> RoutingResult<()> {
        let Some(route) = self.get_next(request, response).await? else {
            return Ok(());
        };
        if route.on_selected(request, response) == Disposition::Skip {
            return Ok(());
        }
        route
            .target()
            .handle(request, response)
            .await
            .map_err(|e| match e.downcast::<RoutingError>() {
                // Errors of nested routers pass through unwrapped.
                Ok(inner) => *inner,
                Err(e) => RoutingError::Handler(e),
            })
    }

    // Lifecycle

    /// Start route targets in order, then the default target.
    pub async fn start(&self) -> RoutingResult<()> {
        let _guard = self.transition.lock().await;
        if self.state() == LifecycleState::Started {
            return Ok(());
        }
        for route in self.routes.snapshot().iter() {
            start_target(route.target()).await?;
        }
        if let Some(default) = self.default_route.load_full() {
            start_target(default.target()).await?;
        }
        self.state.store(LifecycleState::Started as u8, Ordering::Release);
        tracing::info!(routes = self.routes.len(), "Router started");
        Ok(())
    }

    /// Interrupt waiting dispatches, then stop the default target and the
    /// route targets in order.
    pub async fn stop(&self) -> RoutingResult<()> {
        self.interrupt();
        let _guard = self.transition.lock().await;
        if self.state() != LifecycleState::Started {
            return Ok(());
        }
        if let Some(default) = self.default_route.load_full() {
            stop_target(default.target()).await?;
        }
        for route in self.routes.snapshot().iter() {
            stop_target(route.target()).await?;
        }
        self.state.store(LifecycleState::Stopped as u8, Ordering::Release);
        tracing::info!("Router stopped");
        Ok(())
    }
}

async fn start_target(target: &Arc<dyn Handler>) -> RoutingResult<()> {
    if let Some(lifecycle) = target.lifecycle() {
        lifecycle.start().await.map_err(|source| RoutingError::Lifecycle {
            target: target.name().to_string(),
            source,
        })?;
    }
    Ok(())
}

async fn stop_target(target: &Arc<dyn Handler>) -> RoutingResult<()> {
    if let Some(lifecycle) = target.lifecycle() {
        lifecycle.stop().await.map_err(|source| RoutingError::Lifecycle {
            target: target.name().to_string(),
            source,
        })?;
    }
    Ok(())
}

fn check_required_score(score: f32) -> RoutingResult<()> {
    if (0.0..=1.0).contains(&score) {
        Ok(())
    } else {
        Err(RoutingError::InvalidRequiredScore(score))
    }
}

fn check_max_attempts(attempts: u32) -> RoutingResult<()> {
    if attempts == 0 {
        Err(RoutingError::InvalidMaxAttempts)
    } else {
        Ok(())
    }
}

#[async_trait]
impl Handler for Router {
    async fn handle(&self, request: &mut Request, response: &mut Response) -> Result<(), HandlerError> {
        Router::handle(self, request, response).await.map_err(Into::into)
    }

    fn lifecycle(&self) -> Option<&dyn Lifecycle> {
        Some(self)
    }

    fn preferred_matching_mode(&self) -> Option<MatchingMode> {
        Some(MatchingMode::StartsWith)
    }

    fn name(&self) -> &str {
        "router"
    }
}

#[async_trait]
impl Lifecycle for Router {
    async fn start(&self) -> Result<(), HandlerError> {
        Router::start(self).await.map_err(Into::into)
    }

    async fn stop(&self) -> Result<(), HandlerError> {
        Router::stop(self).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::AttributeValue;
    use crate::routing::handler::handler_fn;

    fn tagging(tag: &'static str) -> Arc<dyn Handler> {
        handler_fn(move |_req, resp| {
            resp.set_entity(tag, None);
            Ok(())
        })
    }

    #[test]
    fn test_defaults() {
        let router = Router::new();
        let settings = router.settings();
        assert_eq!(settings.routing_mode, RoutingMode::First);
        assert_eq!(settings.required_score, 0.5);
        assert_eq!(settings.max_attempts, 1);
        assert_eq!(settings.retry_delay, Duration::from_millis(500));
        assert_eq!(settings.default_matching_mode, MatchingMode::Equals);
        assert!(!settings.default_matching_query);
        assert_eq!(router.state(), LifecycleState::Idle);
    }

    #[test]
    fn test_setters_validate() {
        let router = Router::new();
        assert!(matches!(router.set_required_score(1.5), Err(RoutingError::InvalidRequiredScore(_))));
        assert!(router.set_required_score(f32::NAN).is_err());
        assert!(matches!(router.set_max_attempts(0), Err(RoutingError::InvalidMaxAttempts)));
        router.set_required_score(0.8).unwrap();
        router.set_max_attempts(3).unwrap();
        assert_eq!(router.settings().required_score, 0.8);
        assert_eq!(router.settings().max_attempts, 3);

        let config = RouterConfig {
            max_attempts: 0,
            ..RouterConfig::default()
        };
        assert!(Router::from_config(config).is_err());
    }

    #[tokio::test]
    async fn test_first_mode_extracts_variables() {
        let router = Router::new();
        router.attach("/users/{id}", tagging("user")).unwrap();
        router.attach("/users/{id}/orders", tagging("orders")).unwrap();

        let mut request = Request::get("/users/42/orders");
        let mut response = Response::new();
        router.handle(&mut request, &mut response).await.unwrap();

        assert_eq!(response.entity(), Some("orders"));
        assert_eq!(request.attribute("id"), Some(&AttributeValue::Text("42".into())));
    }

    #[tokio::test]
    async fn test_no_match_sets_not_found() {
        let router = Router::new();
        router.attach("/a", tagging("a")).unwrap();

        let mut response = Response::new();
        router.handle(&mut Request::get("/b"), &mut response).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.entity().is_none());
    }

    #[tokio::test]
    async fn test_default_route_used_when_nothing_matches() {
        let router = Router::new();
        router.attach("/a", tagging("a")).unwrap();
        router.attach_default(tagging("fallback")).unwrap();

        let mut response = Response::new();
        router.handle(&mut Request::get("/zzz"), &mut response).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.entity(), Some("fallback"));
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let router = Router::new();
        router
            .attach("/fail", handler_fn(|_, _| Err("boom".into())))
            .unwrap();

        let err = router
            .handle(&mut Request::get("/fail"), &mut Response::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::Handler(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_redirect_routes() {
        let router = Router::new();
        router.redirect_permanent("/old/{id}", "/new/{id}").unwrap();
        router.redirect_see_other("/submit", "/done").unwrap();
        router.redirect_temporary("/tmp/{name}", "/elsewhere/{name}").unwrap();

        let mut response = Response::new();
        router.handle(&mut Request::get("/old/42"), &mut response).await.unwrap();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.location(), Some("/new/42"));

        let mut response = Response::new();
        router.handle(&mut Request::get("/submit"), &mut response).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.location(), Some("/done"));

        let mut response = Response::new();
        router.handle(&mut Request::get("/tmp/x"), &mut response).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.location(), Some("/elsewhere/x"));

        assert!(router.redirect_permanent("/a", "/b/{unclosed").is_err());
        assert_eq!(router.routes().len(), 3);
    }

    #[test]
    fn test_retry_delay_keeps_sub_millisecond_precision() {
        let router = Router::new();
        router.set_retry_delay(Duration::from_micros(1500));
        assert_eq!(router.settings().retry_delay, Duration::from_micros(1500));
        router.set_retry_delay(Duration::from_micros(250));
        assert_eq!(router.settings().retry_delay, Duration::from_micros(250));
    }

    #[test]
    fn test_detach_removes_default_too() {
        let router = Router::new();
        let shared = tagging("shared");
        router.attach("/a", shared.clone()).unwrap();
        router.attach("/b", tagging("b")).unwrap();
        router.attach_default(shared.clone()).unwrap();

        assert_eq!(router.detach(&shared), 2);
        assert_eq!(router.routes().len(), 1);
        assert!(router.default_route().is_none());
    }

    #[test]
    fn test_router_prefers_starts_with() {
        let parent = Router::new();
        let child: Arc<dyn Handler> = Arc::new(Router::new());
        let route = parent.attach("/api", child).unwrap();
        assert_eq!(route.template().unwrap().matching_mode(), MatchingMode::StartsWith);
    }

    #[tokio::test]
    async fn test_start_stop_transitions() {
        let router = Router::new();
        router.start().await.unwrap();
        assert_eq!(router.state(), LifecycleState::Started);
        router.stop().await.unwrap();
        assert_eq!(router.state(), LifecycleState::Stopped);
        router.start().await.unwrap();
        assert_eq!(router.state(), LifecycleState::Started);
    }
}
