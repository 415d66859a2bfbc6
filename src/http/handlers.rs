//! Built-in route targets used by the config-driven server.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderValue, StatusCode};
use serde_json::json;

use crate::config::TargetConfig;
use crate::http::{Request, Response};
use crate::routing::{Handler, HandlerError, RoutingResult, Template};

/// Answers every request with the same status and body.
#[derive(Debug, Clone)]
pub struct FixedHandler {
    status: StatusCode,
    body: String,
    media_type: Option<String>,
}

impl FixedHandler {
    pub fn new(status: StatusCode, body: impl Into<String>, media_type: Option<String>) -> Self {
        Self {
            status,
            body: body.into(),
            media_type,
        }
    }
}

#[async_trait]
impl Handler for FixedHandler {
    async fn handle(&self, _request: &mut Request, response: &mut Response) -> Result<(), HandlerError> {
        response.set_status(self.status);
        if !self.body.is_empty() {
            response.set_entity(self.body.clone(), self.media_type.as_deref().or(Some("text/plain")));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Answers with a JSON description of how the request was routed.
#[derive(Debug, Clone, Default)]
pub struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(&self, request: &mut Request, response: &mut Response) -> Result<(), HandlerError> {
        let body = json!({
            "method": request.method().as_str(),
            "path": request.path(),
            "query": request.query(),
            "base": request.base_path(),
            "remaining": request.remaining_path(),
            "attributes": request.attributes(),
        });
        response.set_entity(body.to_string(), Some("application/json"));
        Ok(())
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Redirects the client to a URI built from the request attributes.
///
/// The location is a URI template such as `/new/{id}`; each variable is
/// resolved from the attribute of the same name, falling back to the
/// variable's default value.
#[derive(Debug, Clone)]
pub struct RedirectHandler {
    location: Template,
    status: StatusCode,
}

impl RedirectHandler {
    pub fn new(location: &str, status: StatusCode) -> RoutingResult<Self> {
        Ok(Self {
            location: Template::compile(location)?,
            status,
        })
    }

    /// `301 Moved Permanently`.
    pub fn permanent(location: &str) -> RoutingResult<Self> {
        Self::new(location, StatusCode::MOVED_PERMANENTLY)
    }

    /// `303 See Other`: retrieve the new location with GET.
    pub fn see_other(location: &str) -> RoutingResult<Self> {
        Self::new(location, StatusCode::SEE_OTHER)
    }

    /// `307 Temporary Redirect`: repeat the request at the new location.
    pub fn temporary(location: &str) -> RoutingResult<Self> {
        Self::new(location, StatusCode::TEMPORARY_REDIRECT)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

#[async_trait]
impl Handler for RedirectHandler {
    async fn handle(&self, request: &mut Request, response: &mut Response) -> Result<(), HandlerError> {
        let target = self
            .location
            .format(|name| request.attribute(name).map(ToString::to_string))?;
        let location = HeaderValue::from_str(&target)?;
        tracing::debug!(location = %target, status = %self.status, "Redirecting");
        response.set_status(self.status);
        response.set_location(location);
        Ok(())
    }

    fn name(&self) -> &str {
        "redirect"
    }
}

/// Instantiate the handler described by `config`.
pub fn build_target(config: &TargetConfig) -> RoutingResult<Arc<dyn Handler>> {
    let handler: Arc<dyn Handler> = match config {
        TargetConfig::Fixed {
            status,
            body,
            media_type,
        } => {
            let status = StatusCode::from_u16(*status).unwrap_or_else(|_| {
                tracing::warn!(status, "Invalid fixed status, using 500");
                StatusCode::INTERNAL_SERVER_ERROR
            });
            Arc::new(FixedHandler::new(status, body.clone(), media_type.clone()))
        }
        TargetConfig::Echo => Arc::new(EchoHandler),
        TargetConfig::Redirect { location, kind } => Arc::new(RedirectHandler::new(location, kind.status())?),
    };
    Ok(handler)
}
