//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → lifecycle::startup builds the Router from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; router settings are changed through
//!   the router's setters, which swap a new `RouterConfig` snapshot
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ExtractConfig, ListenerConfig, ObservabilityConfig, RedirectKind, RouteConfig, RouterConfig, ServerConfig, TargetConfig,
    ValidateConfig,
};
pub use validation::ValidationError;
