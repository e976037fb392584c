// src/error.rs

//! Unified error handling for the resolver and aggregator.

use std::fmt;

use thiserror::Error;

/// Result type alias for jobcount operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed range token in the rules document
    #[error("Validation error: invalid range token '{token}': {message}")]
    RangeToken { token: String, message: String },

    /// Other malformed rules content
    #[error("Validation error: {0}")]
    Validation(String),

    /// The job source could not be reached or initialised
    #[error("Job source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single query against the job source failed or timed out
    #[error("Query failed for {context}: {message}")]
    Query { context: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a range token error naming the offending token.
    pub fn range_token(token: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::RangeToken {
            token: token.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a source-unavailable error.
    pub fn source_unavailable(message: impl fmt::Display) -> Self {
        Self::SourceUnavailable(message.to_string())
    }

    /// Create a query error with context.
    pub fn query(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Query {
            context: context.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_token_message_names_token() {
        let err = AppError::range_token("2400-2300", "end before start");
        assert!(err.to_string().contains("'2400-2300'"));
    }

    #[test]
    fn test_query_error_names_context() {
        let err = AppError::query("Workforce Australia @ 4870", "timed out after 20s");
        assert_eq!(
            err.to_string(),
            "Query failed for Workforce Australia @ 4870: timed out after 20s"
        );
    }
}
