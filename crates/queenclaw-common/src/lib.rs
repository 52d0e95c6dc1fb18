//! # QueenClaw Common
//!
//! Common error types and logging configuration for the QueenClaw offline
//! coordinator.
//!
//! ## Features
//!
//! - Unified error type with source chaining
//! - Logging configuration and setup
//! - Option extension trait

use thiserror::Error;

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat};

/// Unified error type for QueenClaw.
#[derive(Error, Debug)]
pub enum QueenClawError {
    /// Cache storage errors.
    #[error("Cache error: {message}")]
    Cache {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network-related errors.
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Push and notification errors.
    #[error("Push error: {message}")]
    Push {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Window client errors.
    #[error("Client error: {message}")]
    Client {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors.
    #[error("Config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl QueenClawError {
    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with source.
    pub fn network_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a push error.
    pub fn push(message: impl Into<String>) -> Self {
        Self::Push {
            message: message.into(),
            source: None,
        }
    }

    /// Create a push error with source.
    pub fn push_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Push {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a client error.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error with source.
    pub fn config_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            QueenClawError::Cache { .. } => "cache",
            QueenClawError::Network { .. } => "network",
            QueenClawError::Push { .. } => "push",
            QueenClawError::Client { .. } => "client",
            QueenClawError::Config { .. } => "config",
            QueenClawError::Io(_) => "io",
            QueenClawError::NotFound(_) => "not_found",
            QueenClawError::InvalidArgument(_) => "invalid_argument",
        }
    }
}

/// Result type alias for QueenClaw operations.
pub type Result<T> = std::result::Result<T, QueenClawError>;

/// Extension trait for Option.
pub trait OptionExt<T> {
    /// Convert None to a NotFound error.
    fn ok_or_not_found(self, resource: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, resource: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| QueenClawError::NotFound(resource.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(QueenClawError::cache("test").category(), "cache");
        assert_eq!(QueenClawError::network("test").category(), "network");
        assert_eq!(QueenClawError::push("test").category(), "push");
        assert_eq!(
            QueenClawError::NotFound("x".to_string()).category(),
            "not_found"
        );
    }

    #[test]
    fn test_error_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = QueenClawError::network_with_source("fetch failed", io);

        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("fetch failed"));
    }

    #[test]
    fn test_option_ext() {
        let some: Option<i32> = Some(7);
        assert_eq!(some.ok_or_not_found("window").unwrap(), 7);

        let none: Option<i32> = None;
        assert!(matches!(
            none.ok_or_not_found("window"),
            Err(QueenClawError::NotFound(_))
        ));
    }
}
