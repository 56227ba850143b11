//! Error types for Thriftroute
//!
//! Startup errors (configuration, catalog/table validation) are fatal; the
//! request-time decision path never returns these, it degrades to the
//! documented fallbacks instead.

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed for '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Invalid routing data: {0}")]
    Validation(String),

    #[error("Failed to serialize ledger entry: {source}")]
    LedgerSerialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to append to decision ledger '{path}': {source}")]
    LedgerAppend {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
