//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (path, query, base reference, attributes)
//!     → [routing::Router selects a route and invokes its target]
//!     → response.rs (status, entity, media type)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::{build_target, EchoHandler, FixedHandler, RedirectHandler};
pub use request::{AttributeValue, Request};
pub use response::Response;
pub use server::{AppState, HttpServer, ServerError};
