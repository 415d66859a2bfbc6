//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app that bridges every request into a routing Router
//! - Wire up middleware (tracing, request ID)
//! - Buffer request entities up to the configured limit
//! - Start the router before serving and stop it after shutdown

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ListenerConfig;
use crate::http::{Request, Response};
use crate::routing::{Router, RoutingError};

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub max_body_bytes: usize,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Routing(#[from] RoutingError),
}

/// HTTP front end for a routing [`Router`].
pub struct HttpServer {
    router: Arc<Router>,
    app: axum::Router,
}

impl HttpServer {
    pub fn new(router: Arc<Router>, config: &ListenerConfig) -> Self {
        let state = AppState {
            router: router.clone(),
            max_body_bytes: config.max_body_bytes,
        };
        Self {
            router,
            app: Self::build_app(state),
        }
    }

    /// Build the Axum app with all middleware layers.
    fn build_app(state: AppState) -> axum::Router {
        axum::Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The Axum app, for serving elsewhere or for tests.
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }

    /// Start the router, serve until `shutdown` resolves, then stop it.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        self.router.start().await?;
        tracing::info!(address = %addr, "HTTP server starting");

        let served = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await;

        self.router.stop().await?;
        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Convert the HTTP request, route it, and convert the routing response back.
async fn dispatch(State(state): State<AppState>, request: axum::extract::Request) -> axum::response::Response {
    let (parts, body) = request.into_parts();
    let entity = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, limit = state.max_body_bytes, "Failed to read request entity");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request entity too large").into_response();
        }
    };

    let mut request = Request::from_parts(parts, entity);
    let mut response = Response::new();
    match state.router.handle(&mut request, &mut response).await {
        Ok(()) => response.into_response(),
        Err(RoutingError::Interrupted) => {
            (StatusCode::SERVICE_UNAVAILABLE, "Routing interrupted").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, path = %request.path(), "Dispatch failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
