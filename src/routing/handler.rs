//! Route targets.
//!
//! A handler is what a route dispatches to. The router never owns it: the
//! same handler may sit behind several routes and routers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::http::{Request, Response};
use crate::lifecycle::Lifecycle;
use crate::routing::error::HandlerError;
use crate::routing::template::MatchingMode;

#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: &mut Request, response: &mut Response) -> Result<(), HandlerError>;

    /// Start/stop hooks, if this handler has any.
    fn lifecycle(&self) -> Option<&dyn Lifecycle> {
        None
    }

    /// Matching mode to use when attached without an explicit one.
    /// Handlers that delegate the remaining path prefer `StartsWith`.
    fn preferred_matching_mode(&self) -> Option<MatchingMode> {
        None
    }

    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Handler backed by a synchronous closure.
pub struct FnHandler<F> {
    f: F,
}

/// Wrap a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> Arc<FnHandler<F>>
where
    F: Fn(&mut Request, &mut Response) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    Arc::new(FnHandler { f })
}

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut Request, &mut Response) -> Result<(), HandlerError> + Send + Sync,
{
    async fn handle(&self, request: &mut Request, response: &mut Response) -> Result<(), HandlerError> {
        (self.f)(request, response)
    }

    fn name(&self) -> &str {
        "fn_handler"
    }
}

/// Identity comparison of two shared handlers.
pub(crate) fn same_handler(a: &Arc<dyn Handler>, b: &Arc<dyn Handler>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
