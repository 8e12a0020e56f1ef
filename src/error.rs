//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout the library admin tool.
//! All errors are structured and map to specific error codes for JSON output.
//!
//! # Error Categories
//! - `ConnectionFailed`: Database connection errors (after all retry attempts)
//! - `QueryFailed`: Statement or transaction errors reported by `PostgreSQL`
//! - `InvalidInput`: Malformed user input caught before any SQL runs
//! - `UnsafeQuery`: Ad-hoc or spliced SQL rejected by the read-only guard
//! - `ConfigError`: Configuration file or environment errors
//! - `PromptFailed`: Terminal prompt could not be read

use thiserror::Error;

/// Main error type for library operations
#[derive(Error, Debug)]
pub enum LibraryError {
    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Invalid input or missing required parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// SQL rejected by the read-only guard
    #[error("Unsafe query: {0}")]
    UnsafeQuery(String),

    /// Configuration error (file not found, invalid JSON, bad port, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Interactive prompt failed (closed stdin, not a terminal)
    #[error("Prompt failed: {0}")]
    PromptFailed(String),
}

impl LibraryError {
    /// Convert error to error code string for JSON output
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::QueryFailed(_) => "QUERY_FAILED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::UnsafeQuery(_) => "UNSAFE_QUERY",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::PromptFailed(_) => "PROMPT_FAILED",
        }
    }

    /// Get human-readable error message (never contains credentials)
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an unsafe query error
    pub fn unsafe_query(message: impl Into<String>) -> Self {
        Self::UnsafeQuery(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a prompt failure error
    pub fn prompt_failed(message: impl Into<String>) -> Self {
        Self::PromptFailed(message.into())
    }
}

impl From<dialoguer::Error> for LibraryError {
    fn from(err: dialoguer::Error) -> Self {
        Self::prompt_failed(err.to_string())
    }
}

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, LibraryError>;
