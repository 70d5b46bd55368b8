//! Error types and handling for the `GrowCast` engine

use thiserror::Error;

/// Main error type for the `GrowCast` engine
#[derive(Error, Debug)]
pub enum GrowcastError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl GrowcastError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            GrowcastError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            GrowcastError::Api { .. } => {
                "Unable to reach external growing-data services. Please check your internet connection."
                    .to_string()
            }
            GrowcastError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            GrowcastError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache directory.".to_string()
            }
            GrowcastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            GrowcastError::General { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = GrowcastError::config("missing API key");
        assert!(matches!(config_err, GrowcastError::Config { .. }));

        let api_err = GrowcastError::api("connection failed");
        assert!(matches!(api_err, GrowcastError::Api { .. }));

        let validation_err = GrowcastError::validation("invalid coordinates");
        assert!(matches!(validation_err, GrowcastError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = GrowcastError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = GrowcastError::api("test");
        assert!(api_err.user_message().contains("Unable to reach"));

        let validation_err = GrowcastError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let growcast_err: GrowcastError = io_err.into();
        assert!(matches!(growcast_err, GrowcastError::Io { .. }));
    }
}
