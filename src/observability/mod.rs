//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routing and HTTP subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (dispatch counters)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → any recorder installed for the `metrics` facade
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the HTTP bridge via tower-http layers
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
