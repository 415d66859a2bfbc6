//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let config = parse_config(
            r#"
            [[routes]]
            name = "hello"
            pattern = "/hello"
            target = { type = "fixed", body = "hi" }
            "#,
        )
        .unwrap();
        assert_eq!(config.routes[0].name, "hello");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_config("routes = 3"), Err(ConfigError::Parse(_))));

        let err = parse_config("[router]\nmax_attempts = 0\nrequired_score = 3.0").unwrap_err();
        assert!(matches!(&err, ConfigError::Validation(errors) if errors.len() == 2));
        assert!(err.to_string().starts_with("Validation failed: "));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/restroute.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
