//! A single routing entry: a matcher plus a shared target.
//!
//! # Responsibilities
//! - Score a request against the route's template or custom scorer
//! - On selection, advance the request's base path and write attributes
//! - Run configured query extracts and attribute validations
//!
//! # Design Decisions
//! - Scoring is pure; every side effect happens in `on_selected`
//! - The matcher is swapped atomically so concurrent scans never see a
//!   half-updated template

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::StatusCode;
use regex::Regex;

use crate::http::{AttributeValue, Request, Response};
use crate::routing::error::RoutingResult;
use crate::routing::handler::{same_handler, Handler};
use crate::routing::matcher::Scorer;
use crate::routing::template::{MatchingMode, Template};

/// What decides whether a request fits a route.
#[derive(Clone)]
pub(crate) enum RouteMatcher {
    Template(Arc<Template>),
    Scorer(Arc<dyn Scorer>),
}

/// Whether the target should be invoked after `on_selected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    /// The response already carries an error status.
    Skip,
}

#[derive(Debug, Clone)]
struct QueryExtract {
    attribute: String,
    parameter: String,
    first: bool,
}

#[derive(Debug, Clone)]
struct Validation {
    attribute: String,
    required: bool,
    format: Option<Regex>,
}

impl Validation {
    /// Error message when `request` fails this validation.
    fn check(&self, request: &Request) -> Option<String> {
        match request.attribute(&self.attribute) {
            None if self.required => Some(format!("Missing required attribute: {}", self.attribute)),
            None => None,
            Some(value) => {
                let format = self.format.as_ref()?;
                let valid = match value {
                    AttributeValue::Text(text) => format.is_match(text),
                    AttributeValue::List(values) => values.iter().all(|v| format.is_match(v)),
                };
                (!valid).then(|| format!("Invalid value for attribute {}: {}", self.attribute, value))
            }
        }
    }
}

pub struct Route {
    matcher: ArcSwap<RouteMatcher>,
    target: Arc<dyn Handler>,
    matching_query: AtomicBool,
    extracts: ArcSwap<Vec<QueryExtract>>,
    validations: ArcSwap<Vec<Validation>>,
}

impl Route {
    /// Route matching `template` against the remaining part of requests.
    pub fn new(template: Template, target: Arc<dyn Handler>) -> Self {
        Self::with_matcher(RouteMatcher::Template(Arc::new(template)), target)
    }

    /// Route whose score comes entirely from `scorer`.
    pub fn with_scorer(scorer: impl Scorer + 'static, target: Arc<dyn Handler>) -> Self {
        Self::with_matcher(RouteMatcher::Scorer(Arc::new(scorer)), target)
    }

    fn with_matcher(matcher: RouteMatcher, target: Arc<dyn Handler>) -> Self {
        Self {
            matcher: ArcSwap::from_pointee(matcher),
            target,
            matching_query: AtomicBool::new(false),
            extracts: ArcSwap::from_pointee(Vec::new()),
            validations: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn target(&self) -> &Arc<dyn Handler> {
        &self.target
    }

    /// Whether this route dispatches to `handler`.
    pub fn targets(&self, handler: &Arc<dyn Handler>) -> bool {
        same_handler(&self.target, handler)
    }

    /// The current template; `None` for scorer routes.
    pub fn template(&self) -> Option<Arc<Template>> {
        match &**self.matcher.load() {
            RouteMatcher::Template(template) => Some(template.clone()),
            RouteMatcher::Scorer(_) => None,
        }
    }

    /// Replace the matcher with `template`. Visible from the next score.
    pub fn set_template(&self, template: Template) {
        self.matcher.store(Arc::new(RouteMatcher::Template(Arc::new(template))));
    }

    /// Recompile the current template with another matching mode.
    /// No effect on scorer routes.
    pub fn set_matching_mode(&self, mode: MatchingMode) {
        self.matcher.rcu(|current| match &**current {
            RouteMatcher::Template(template) if template.matching_mode() != mode => {
                Arc::new(RouteMatcher::Template(Arc::new(template.with_matching_mode(mode))))
            }
            _ => current.clone(),
        });
    }

    pub fn is_matching_query(&self) -> bool {
        self.matching_query.load(Ordering::Relaxed)
    }

    /// Include `?query` in the text matched by the template.
    pub fn set_matching_query(&self, matching_query: bool) {
        self.matching_query.store(matching_query, Ordering::Relaxed);
    }

    /// Copy query parameter `parameter` into attribute `attribute` on selection.
    /// `first` keeps only the first value; otherwise all values are stored as a list.
    pub fn extract_query(&self, attribute: impl Into<String>, parameter: impl Into<String>, first: bool) -> &Self {
        let extract = QueryExtract {
            attribute: attribute.into(),
            parameter: parameter.into(),
            first,
        };
        self.extracts.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(extract.clone());
            next
        });
        self
    }

    /// Check attribute `attribute` on selection. When `format` is given the
    /// whole value must match it.
    pub fn validate(&self, attribute: impl Into<String>, required: bool, format: Option<&str>) -> RoutingResult<&Self> {
        let format = format
            .map(|format| Regex::new(&format!("^(?:{format})$")))
            .transpose()?;
        let validation = Validation {
            attribute: attribute.into(),
            required,
            format,
        };
        self.validations.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(validation.clone());
            next
        });
        Ok(self)
    }

    /// Score of `request` for this route, with `required_score` as the
    /// threshold partial matches are scaled from.
    pub fn score(&self, request: &Request, response: &Response, required_score: f32) -> f32 {
        let matcher = self.matcher.load();
        let score = match &**matcher {
            RouteMatcher::Template(template) => {
                let remaining = request.remaining_part(self.is_matching_query());
                match template.matches(&remaining) {
                    None => 0.0,
                    Some(_) if remaining.is_empty() => 1.0,
                    Some(consumed) => {
                        required_score + (1.0 - required_score) * consumed as f32 / remaining.len() as f32
                    }
                }
            }
            RouteMatcher::Scorer(scorer) => scorer.score(request, response),
        };
        tracing::trace!(route = ?self, score, "Route scored");
        score
    }

    /// Apply the side effects of being selected. Called once per dispatch,
    /// for the winning route only.
    pub fn on_selected(&self, request: &mut Request, response: &mut Response) -> Disposition {
        let matcher = self.matcher.load_full();
        if let RouteMatcher::Template(template) = &*matcher {
            let remaining = request.remaining_part(self.is_matching_query()).into_owned();
            let Some(matched) = template.parse(&remaining) else {
                // The matcher was swapped between scoring and selection.
                tracing::warn!(route = ?self, remaining = %remaining, "Selected route no longer matches");
                response.set_status(StatusCode::NOT_FOUND);
                return Disposition::Skip;
            };
            request.advance_base(matched.consumed);
            for (name, value) in matched.variables {
                request.set_attribute(name, value);
            }
        }

        self.apply_extracts(request);

        for validation in self.validations.load().iter() {
            if let Some(message) = validation.check(request) {
                tracing::debug!(route = ?self, attribute = %validation.attribute, "Attribute validation failed");
                response.set_status(StatusCode::BAD_REQUEST);
                response.set_entity(message, Some("text/plain"));
                return Disposition::Skip;
            }
        }

        tracing::debug!(
            route = ?self,
            base = %request.base_path(),
            remaining = %request.remaining_path(),
            "Route selected"
        );
        Disposition::Continue
    }

    fn apply_extracts(&self, request: &mut Request) {
        let extracts = self.extracts.load();
        if extracts.is_empty() {
            return;
        }
        let pairs = request.query_pairs();
        for extract in extracts.iter() {
            let mut values = pairs
                .iter()
                .filter(|(name, _)| *name == extract.parameter)
                .map(|(_, value)| value.clone());
            let value = if extract.first {
                values.next().map(AttributeValue::Text)
            } else {
                let all: Vec<String> = values.collect();
                (!all.is_empty()).then_some(AttributeValue::List(all))
            };
            if let Some(value) = value {
                request.set_attribute(extract.attribute.clone(), value);
            }
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Route");
        match &**self.matcher.load() {
            RouteMatcher::Template(template) => debug
                .field("pattern", &template.pattern())
                .field("mode", &template.matching_mode()),
            RouteMatcher::Scorer(_) => debug.field("scorer", &"custom"),
        };
        debug.field("target", &self.target.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::handler_fn;

    fn noop() -> Arc<dyn Handler> {
        handler_fn(|_, _| Ok(()))
    }

    fn route(pattern: &str, mode: MatchingMode) -> Route {
        let template = Template::builder(pattern).matching_mode(mode).build().unwrap();
        Route::new(template, noop())
    }

    #[test]
    fn test_score_full_and_partial() {
        let response = Response::new();
        let equals = route("/users/{id}", MatchingMode::Equals);
        assert_eq!(equals.score(&Request::get("/users/42"), &response, 0.5), 1.0);
        assert_eq!(equals.score(&Request::get("/users/42/orders"), &response, 0.5), 0.0);

        let prefix = route("/docs", MatchingMode::StartsWith);
        let score = prefix.score(&Request::get("/docs/api.html"), &response, 0.5);
        assert!(score > 0.5 && score < 1.0, "partial score was {score}");
        assert_eq!(prefix.score(&Request::get("/docs"), &response, 0.5), 1.0);
    }

    #[test]
    fn test_empty_remaining_scores_one() {
        let mut request = Request::get("/docs");
        request.advance_base(5);
        let empty = route("", MatchingMode::StartsWith);
        assert_eq!(empty.score(&request, &Response::new(), 0.5), 1.0);
    }

    #[test]
    fn test_matching_query() {
        let r = route("/search?q={term}", MatchingMode::Equals);
        let request = Request::get("/search?q=rust");
        assert_eq!(r.score(&request, &Response::new(), 0.5), 0.0);

        r.set_matching_query(true);
        assert_eq!(r.score(&request, &Response::new(), 0.5), 1.0);
    }

    #[test]
    fn test_on_selected_advances_base_and_sets_variables() {
        let r = route("/users/{id}", MatchingMode::StartsWith);
        let mut request = Request::get("/users/42/orders");
        let mut response = Response::new();

        assert_eq!(r.on_selected(&mut request, &mut response), Disposition::Continue);
        assert_eq!(request.base_path(), "/users/42");
        assert_eq!(request.remaining_path(), "/orders");
        assert_eq!(request.attribute("id").and_then(AttributeValue::as_str), Some("42"));
    }

    #[test]
    fn test_set_matching_mode_swaps_template() {
        let r = route("/docs", MatchingMode::Equals);
        let request = Request::get("/docs/api");
        assert_eq!(r.score(&request, &Response::new(), 0.5), 0.0);

        r.set_matching_mode(MatchingMode::StartsWith);
        assert!(r.score(&request, &Response::new(), 0.5) > 0.5);
        assert_eq!(r.template().unwrap().matching_mode(), MatchingMode::StartsWith);
    }

    #[test]
    fn test_extract_query_first_and_all() {
        let r = route("/list", MatchingMode::Equals);
        r.extract_query("page", "p", true).extract_query("tags", "tag", false);

        let mut request = Request::get("/list?p=2&p=3&tag=a&tag=b");
        r.on_selected(&mut request, &mut Response::new());

        assert_eq!(request.attribute("page"), Some(&AttributeValue::Text("2".into())));
        assert_eq!(
            request.attribute("tags"),
            Some(&AttributeValue::List(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_validation_failure_sets_bad_request() {
        let r = route("/users/{id}", MatchingMode::Equals);
        r.validate("id", true, Some("[0-9]+")).unwrap();

        let mut response = Response::new();
        let mut request = Request::get("/users/abc");
        assert_eq!(r.on_selected(&mut request, &mut response), Disposition::Skip);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut response = Response::new();
        let mut request = Request::get("/users/42");
        assert_eq!(r.on_selected(&mut request, &mut response), Disposition::Continue);
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_missing_required_attribute() {
        let r = route("/list", MatchingMode::Equals);
        r.extract_query("page", "p", true);
        r.validate("page", true, None).unwrap();

        let mut response = Response::new();
        assert_eq!(r.on_selected(&mut Request::get("/list"), &mut response), Disposition::Skip);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_validation_format() {
        let r = route("/list", MatchingMode::Equals);
        assert!(r.validate("page", false, Some("(")).is_err());
    }

    #[test]
    fn test_scorer_route() {
        let r = Route::with_scorer(|_: &Request, _: &Response| 0.7, noop());
        assert!(r.template().is_none());
        assert_eq!(r.score(&Request::get("/anything"), &Response::new(), 0.5), 0.7);

        let mut request = Request::get("/anything");
        assert_eq!(r.on_selected(&mut request, &mut Response::new()), Disposition::Continue);
        assert_eq!(request.base_path(), "");
    }
}
