//! Routing error definitions.

use thiserror::Error;

/// Boxed error returned by handlers and lifecycle hooks.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the routing engine.
///
/// A request that matches no route is not an error: it is reported through a
/// 404 status on the response.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The URI template is syntactically invalid.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A variable name appears more than once in a template.
    #[error("variable {name:?} repeated in pattern {pattern:?}")]
    DuplicateVariable { pattern: String, name: String },

    /// A custom regular expression or validation format failed to compile.
    #[error("invalid regular expression: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// Only URI templates can be formatted back into a path.
    #[error("template {0:?} is a regular expression and cannot be formatted")]
    NotFormattable(String),

    /// Required score outside of [0, 1].
    #[error("required score {0} is outside of [0, 1]")]
    InvalidRequiredScore(f32),

    /// At least one selection attempt is needed.
    #[error("max attempts must be at least 1")]
    InvalidMaxAttempts,

    /// The retry wait was interrupted.
    #[error("routing interrupted while waiting for a retry")]
    Interrupted,

    /// The selected target failed.
    #[error("handler failed: {0}")]
    Handler(#[source] HandlerError),

    /// A target's start or stop hook failed.
    #[error("lifecycle hook of {target} failed: {source}")]
    Lifecycle {
        target: String,
        #[source]
        source: HandlerError,
    },
}

/// Result type for routing operations.
pub type RoutingResult<T> = Result<T, RoutingError>;
