//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>ms, <number>s, <number>m, or <number>m<number>s (e.g., 500ms, 2s, 1.5s, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when parsing a resolution string
#[derive(Debug, Clone, Error)]
#[error("Invalid resolution: \"{input}\". Expected <width>x<height> (e.g., 1920x1080)")]
pub struct ResolutionParseError {
    pub input: String,
}

/// Error when an unsupported image format is requested
#[derive(Debug, Clone, Error)]
#[error("Invalid image format: \"{input}\". Valid formats are: jpg, jpeg, png")]
pub struct ImageFormatParseError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

impl ConfigError {
    /// Shorthand for a validation error on `key`
    pub fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::ValidationError {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_error_mentions_input() {
        let err = DurationParseError {
            input: "soon".to_string(),
        };
        assert!(err.to_string().contains("\"soon\""));
    }

    #[test]
    fn validation_error_display() {
        let err = ConfigError::invalid("quality", "must be between 1 and 100");
        assert_eq!(
            err.to_string(),
            "Invalid config value for 'quality': must be between 1 and 100"
        );
    }
}
