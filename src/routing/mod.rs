//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query, base reference)
//!     → router.rs (settings snapshot, attempt loop, default route)
//!     → route_list.rs (first / last / best / next / random / custom scan)
//!     → route.rs (score: template match over the remaining part, or custom scorer)
//!     → route.rs on_selected (advance base, write attributes, validate)
//!     → handler.rs (target handles the request; may be a nested Router)
//!     → Return: Ok, or 404 on the response when nothing qualified
//!
//! Template Compilation (at attach time):
//!     pattern "/users/{id}"
//!     → template.rs (literal and variable segments)
//!     → variable.rs (per-variable character class)
//!     → anchored regexes for EQUALS and STARTS_WITH
//! ```
//!
//! # Design Decisions
//! - Routes are added and removed at runtime by copy-on-write swaps
//! - Scoring is pure; side effects happen only for the selected route
//! - Deterministic for every mode except `Random`
//! - A Router is itself a Handler, so routers nest

pub mod error;
pub mod handler;
pub mod matcher;
pub mod route;
pub mod route_list;
pub mod router;
pub mod template;
pub mod variable;

pub use error::{HandlerError, RoutingError, RoutingResult};
pub use handler::{handler_fn, FnHandler, Handler};
pub use matcher::{AllOf, QueryScorer, Scorer};
pub use route::{Disposition, Route};
pub use route_list::RouteList;
pub use router::{CustomSelector, Router, RoutingMode};
pub use template::{MatchingMode, Template, TemplateBuilder, TemplateMatch};
pub use variable::{Variable, VariableType};
