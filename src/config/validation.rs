//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (required score, attempts, status codes)
//! - Compile every route pattern, redirect location and validation format up front
//! - Detect duplicate route names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::StatusCode;
use thiserror::Error;

use crate::config::schema::{ServerConfig, TargetConfig};
use crate::routing::Template;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("required score {0} is outside of [0, 1]")]
    RequiredScore(f32),

    #[error("max attempts must be at least 1")]
    MaxAttempts,

    #[error("route at index {0} has an empty name")]
    EmptyRouteName(usize),

    #[error("duplicate route name {0:?}")]
    DuplicateRouteName(String),

    #[error("route {route:?}: {reason}")]
    Pattern { route: String, reason: String },

    #[error("route {route:?}: invalid format for attribute {attribute:?}: {reason}")]
    Format {
        route: String,
        attribute: String,
        reason: String,
    },

    #[error("{owner}: invalid status code {status}")]
    Status { owner: String, status: u16 },

    #[error("{owner}: invalid redirect location: {reason}")]
    Location { owner: String, reason: String },

    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let router = &config.router;
    if !(0.0..=1.0).contains(&router.required_score) {
        errors.push(ValidationError::RequiredScore(router.required_score));
    }
    if router.max_attempts == 0 {
        errors.push(ValidationError::MaxAttempts);
    }

    let mut names = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.is_empty() {
            errors.push(ValidationError::EmptyRouteName(index));
        } else if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }

        if let Err(e) = Template::compile(&route.pattern) {
            errors.push(ValidationError::Pattern {
                route: route.name.clone(),
                reason: e.to_string(),
            });
        }

        for check in &route.validate {
            if let Some(format) = &check.format {
                if let Err(e) = regex::Regex::new(&format!("^(?:{format})$")) {
                    errors.push(ValidationError::Format {
                        route: route.name.clone(),
                        attribute: check.attribute.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        validate_target(&route.target, &format!("route {:?}", route.name), &mut errors);
    }

    if let Some(target) = &config.default_route {
        validate_target(target, "default route", &mut errors);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_target(target: &TargetConfig, owner: &str, errors: &mut Vec<ValidationError>) {
    match target {
        TargetConfig::Fixed { status, .. } => {
            if StatusCode::from_u16(*status).is_err() {
                errors.push(ValidationError::Status {
                    owner: owner.to_string(),
                    status: *status,
                });
            }
        }
        TargetConfig::Redirect { location, .. } => {
            if let Err(e) = Template::compile(location) {
                errors.push(ValidationError::Location {
                    owner: owner.to_string(),
                    reason: e.to_string(),
                });
            }
        }
        TargetConfig::Echo => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    fn route(name: &str, pattern: &str) -> RouteConfig {
        RouteConfig {
            name: name.to_string(),
            pattern: pattern.to_string(),
            mode: None,
            matching_query: None,
            extract: Vec::new(),
            validate: Vec::new(),
            target: TargetConfig::Echo,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "nowhere".to_string();
        config.router.required_score = 2.0;
        config.router.max_attempts = 0;
        config.routes = vec![route("a", "/a"), route("a", "/{unclosed"), route("", "/c")];
        config.default_route = Some(TargetConfig::Fixed {
            status: 42,
            body: String::new(),
            media_type: None,
        });
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::BindAddress("nowhere".into())));
        assert!(errors.contains(&ValidationError::RequiredScore(2.0)));
        assert!(errors.contains(&ValidationError::MaxAttempts));
        assert!(errors.contains(&ValidationError::DuplicateRouteName("a".into())));
        assert!(errors.contains(&ValidationError::EmptyRouteName(2)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Pattern { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Status { status: 42, .. })));
        assert!(errors.contains(&ValidationError::LogLevel("loud".into())));
    }

    #[test]
    fn test_bad_validation_format() {
        let mut config = ServerConfig::default();
        let mut r = route("users", "/users/{id}");
        r.validate.push(crate::config::schema::ValidateConfig {
            attribute: "id".into(),
            required: true,
            format: Some("[0-9".into()),
        });
        config.routes.push(r);

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(&errors[0], ValidationError::Format { attribute, .. } if attribute == "id"));
    }

    #[test]
    fn test_bad_redirect_location() {
        let mut config = ServerConfig::default();
        let mut r = route("old", "/old/{id}");
        r.target = TargetConfig::Redirect {
            location: "/new/{id".into(),
            kind: crate::config::RedirectKind::Permanent,
        };
        config.routes.push(r);

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(&errors[0], ValidationError::Location { owner, .. } if owner == "route \"old\""));
    }
}
