//! Custom route scoring.
//!
//! # Responsibilities
//! - Define the scoring capability used by non-template routes
//! - Provide graduated scorers (query parameters) and an AND combinator
//!
//! # Design Decisions
//! - Scores live in [0, 1]; negative means "not applicable"
//! - Scoring is pure: no request mutation, no extraction

use crate::http::{Request, Response};

/// Computes how well a request fits a route.
pub trait Scorer: Send + Sync {
    fn score(&self, request: &Request, response: &Response) -> f32;
}

impl<F> Scorer for F
where
    F: Fn(&Request, &Response) -> f32 + Send + Sync,
{
    fn score(&self, request: &Request, response: &Response) -> f32 {
        self(request, response)
    }
}

/// Scores by the fraction of expected query parameters present.
#[derive(Debug, Clone, Default)]
pub struct QueryScorer {
    expected: Vec<(String, Option<String>)>,
}

impl QueryScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect a parameter with any value.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.expected.push((name.into(), None));
        self
    }

    /// Expect a parameter with a specific value.
    pub fn param_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.expected.push((name.into(), Some(value.into())));
        self
    }
}

impl Scorer for QueryScorer {
    fn score(&self, request: &Request, _response: &Response) -> f32 {
        if self.expected.is_empty() {
            return 1.0;
        }
        let pairs = request.query_pairs();
        let found = self
            .expected
            .iter()
            .filter(|(name, value)| {
                pairs.iter().any(|(n, v)| {
                    n == name && value.as_ref().map_or(true, |expected| expected == v)
                })
            })
            .count();
        found as f32 / self.expected.len() as f32
    }
}

/// Combines scorers with AND semantics: the lowest score wins.
#[derive(Default)]
pub struct AllOf {
    scorers: Vec<Box<dyn Scorer>>,
}

impl AllOf {
    pub fn new(scorers: Vec<Box<dyn Scorer>>) -> Self {
        Self { scorers }
    }
}

impl Scorer for AllOf {
    fn score(&self, request: &Request, response: &Response) -> f32 {
        self.scorers
            .iter()
            .map(|s| s.score(request, response))
            .fold(1.0, f32::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_scorer_is_graduated() {
        let scorer = QueryScorer::new().param("page").param_value("sort", "asc");
        let response = Response::new();

        assert_eq!(scorer.score(&Request::get("/list"), &response), 0.0);
        assert_eq!(scorer.score(&Request::get("/list?page=2"), &response), 0.5);
        assert_eq!(scorer.score(&Request::get("/list?page=2&sort=desc"), &response), 0.5);
        assert_eq!(scorer.score(&Request::get("/list?page=2&sort=asc"), &response), 1.0);
    }

    #[test]
    fn test_closure_scorer() {
        let scorer = |req: &Request, _: &Response| if req.path() == "/a" { 0.9 } else { -1.0 };
        assert_eq!(scorer.score(&Request::get("/a"), &Response::new()), 0.9);
        assert_eq!(scorer.score(&Request::get("/b"), &Response::new()), -1.0);
    }

    #[test]
    fn test_all_of_takes_minimum() {
        let scorers: Vec<Box<dyn Scorer>> = vec![
            Box::new(|_: &Request, _: &Response| 0.8),
            Box::new(QueryScorer::new().param("x")),
        ];
        let all = AllOf::new(scorers);
        assert_eq!(all.score(&Request::get("/?x=1"), &Response::new()), 0.8);
        assert_eq!(all.score(&Request::get("/"), &Response::new()), 0.0);
    }
}
