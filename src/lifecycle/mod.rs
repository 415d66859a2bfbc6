//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Router::start():
//!     IDLE/STOPPED → start each route target in order → start default target → STARTED
//!
//! Router::stop():
//!     STARTED → interrupt waiting dispatches → stop default target
//!             → stop each route target in order → STOPPED
//!
//! Server startup (startup.rs):
//!     Load config → Validate → Build router → Start router → Serve
//! ```
//!
//! # Design Decisions
//! - Lifecycle hooks are a capability separate from request handling
//! - Start order is routes then default; stop order is default then routes
//! - Hooks of shared targets may run more than once and should be idempotent

pub mod signal;
pub mod startup;

use async_trait::async_trait;

use crate::routing::error::HandlerError;

pub use signal::Signal;

/// Start and stop hooks of a route target.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    async fn start(&self) -> Result<(), HandlerError>;
    async fn stop(&self) -> Result<(), HandlerError>;
}

/// State of a startable component.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle = 0,
    Started = 1,
    Stopped = 2,
}

impl From<u8> for LifecycleState {
    fn from(val: u8) -> Self {
        match val {
            1 => LifecycleState::Started,
            2 => LifecycleState::Stopped,
            _ => LifecycleState::Idle,
        }
    }
}
