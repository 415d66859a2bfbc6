//! Request routing engine with URI templates, scored route selection and
//! an HTTP front end.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ServerConfig;
pub use http::{HttpServer, Request, Response};
pub use lifecycle::{Lifecycle, LifecycleState, Signal};
pub use routing::{Handler, Route, Router, RoutingError, RoutingMode, Template};
