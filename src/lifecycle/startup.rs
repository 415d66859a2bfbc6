//! Router assembly from configuration.
//!
//! # Responsibilities
//! - Build the Router from validated settings
//! - Attach configured routes in order, then the default route
//! - Apply per-route matching options, query extracts and validations

use std::sync::Arc;

use crate::config::{RouteConfig, ServerConfig};
use crate::http::build_target;
use crate::routing::{Route, Router, RoutingResult};

/// Build a router serving the routing table of `config`.
pub fn build_router(config: &ServerConfig) -> RoutingResult<Arc<Router>> {
    let router = Router::from_config(config.router.clone())?;

    for route_config in &config.routes {
        let route = attach_route(&router, route_config)?;
        tracing::info!(name = %route_config.name, route = ?route, "Route configured");
    }

    if let Some(target) = &config.default_route {
        router.attach_default(build_target(target)?)?;
    }

    Ok(Arc::new(router))
}

fn attach_route(router: &Router, config: &RouteConfig) -> RoutingResult<Arc<Route>> {
    let target = build_target(&config.target)?;
    let route = match config.mode {
        Some(mode) => router.attach_with_mode(&config.pattern, target, mode)?,
        None => router.attach(&config.pattern, target)?,
    };

    if let Some(matching_query) = config.matching_query {
        route.set_matching_query(matching_query);
    }
    for extract in &config.extract {
        route.extract_query(extract.attribute.clone(), extract.parameter.clone(), extract.first);
    }
    for check in &config.validate {
        route.validate(check.attribute.clone(), check.required, check.format.as_deref())?;
    }
    Ok(route)
}
