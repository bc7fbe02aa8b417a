//! Error types for the Eye Tribe client
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using EyeTribeError
pub type Result<T> = std::result::Result<T, EyeTribeError>;

/// Unified error type for client operations
#[derive(Debug, Error)]
pub enum EyeTribeError {
    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Not connected to a tracker server")]
    NotConnected,

    #[error("Timed out after {0} ms waiting for a matching frame")]
    Timeout(u64),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Decoding error: {0}")]
    Decoding(String),

    // -------------------------------------------------------------------------
    // Response Errors
    // -------------------------------------------------------------------------
    #[error("Field '{field}' missing from {category}/{request} response")]
    FieldMissing {
        category: String,
        request: String,
        field: String,
    },

    #[error("Field '{field}' has type {found}, expected {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    // -------------------------------------------------------------------------
    // State Errors
    // -------------------------------------------------------------------------
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EyeTribeError {
    /// True for failures of the underlying connection rather than the protocol
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            EyeTribeError::Connection(_) | EyeTribeError::NotConnected | EyeTribeError::Timeout(_)
        )
    }
}
