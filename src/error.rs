//! Error types for HiveKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using HiveError
pub type Result<T> = std::result::Result<T, HiveError>;

/// Unified error type for HiveKV operations
#[derive(Debug, Error)]
pub enum HiveError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("bad format: {0}")]
    BadFormat(String),

    #[error("no message")]
    NoMessage,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("key not found")]
    KeyNotFound,

    #[error("store is not open")]
    StoreClosed,

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HiveError {
    /// True for errors the parser recovers from by resetting
    pub fn is_protocol(&self) -> bool {
        matches!(self, HiveError::UnknownCommand(_) | HiveError::BadFormat(_))
    }
}
