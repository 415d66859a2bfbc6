//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::routing::{MatchingMode, RoutingMode};

/// Root configuration for the routing server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Router settings.
    pub router: RouterConfig,

    /// Routes, in attachment order.
    pub routes: Vec<RouteConfig>,

    /// Target used when no route qualifies.
    pub default_route: Option<TargetConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest request entity accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Router settings. Swapped as a whole at runtime.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Selection strategy.
    pub routing_mode: RoutingMode,

    /// Minimum score for a route to qualify, in [0, 1].
    pub required_score: f32,

    /// Selection attempts per request (at least 1).
    pub max_attempts: u32,

    /// Wait between attempts. Written in whole milliseconds in config files.
    #[serde(rename = "retry_delay_ms", with = "millis")]
    pub retry_delay: Duration,

    /// Matching mode of routes attached without an explicit one.
    pub default_matching_mode: MatchingMode,

    /// Whether new routes match the query string too.
    pub default_matching_query: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            routing_mode: RoutingMode::First,
            required_score: 0.5,
            max_attempts: 1,
            retry_delay: Duration::from_millis(500),
            default_matching_mode: MatchingMode::Equals,
            default_matching_query: false,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    // Sub-millisecond parts are dropped on output only.
    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// A route attached to the router.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// URI template, e.g. "/users/{id}".
    pub pattern: String,

    /// Matching mode; the router default when absent.
    pub mode: Option<MatchingMode>,

    /// Match the query string too; the router default when absent.
    pub matching_query: Option<bool>,

    /// Query parameters copied into attributes.
    #[serde(default)]
    pub extract: Vec<ExtractConfig>,

    /// Attribute checks run on selection.
    #[serde(default)]
    pub validate: Vec<ValidateConfig>,

    /// What the route dispatches to.
    pub target: TargetConfig,
}

/// Query parameter extraction.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractConfig {
    pub attribute: String,
    pub parameter: String,

    /// Keep only the first value (default: true).
    #[serde(default = "default_true")]
    pub first: bool,
}

fn default_true() -> bool {
    true
}

/// Attribute validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidateConfig {
    pub attribute: String,

    #[serde(default)]
    pub required: bool,

    /// Regular expression the whole value must match.
    pub format: Option<String>,
}

/// Built-in route targets.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetConfig {
    /// Always answers with the same status and body.
    Fixed {
        #[serde(default = "default_status")]
        status: u16,
        #[serde(default)]
        body: String,
        media_type: Option<String>,
    },
    /// Answers with a JSON description of the routed request.
    Echo,
    /// Redirects to a URI template filled from the request attributes.
    Redirect {
        location: String,
        #[serde(default)]
        kind: RedirectKind,
    },
}

/// Redirection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectKind {
    /// 301
    Permanent,
    /// 303
    SeeOther,
    /// 307
    #[default]
    Temporary,
}

impl RedirectKind {
    pub fn status(self) -> StatusCode {
        match self {
            RedirectKind::Permanent => StatusCode::MOVED_PERMANENTLY,
            RedirectKind::SeeOther => StatusCode::SEE_OTHER,
            RedirectKind::Temporary => StatusCode::TEMPORARY_REDIRECT,
        }
    }
}

fn default_status() -> u16 {
    200
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
