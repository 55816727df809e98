//! Error types for the Whisperer guardrail core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the whole guardrail core.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. Grounding failures
/// (PARTIAL/UNGROUNDED verdicts) are policy outcomes, not errors, and never
/// appear here.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum WhispererError {
    /// Contract violation: the scorer or controller received an empty
    /// answer or question. Surfaced immediately, never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The model generation call failed (network/auth/rate-limit).
    /// Distinct from an ungrounded verdict; this core never retries it.
    #[error("Model unavailable: {message}")]
    ModelUnavailable {
        message: String,
        status_code: Option<u16>,
        is_retryable: bool,
    },

    /// The caller cancelled the turn while a generation call was in flight.
    #[error("Turn cancelled by caller")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WhispererError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a ModelUnavailable error without HTTP status information
    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            message: message.into(),
            status_code: None,
            is_retryable: false,
        }
    }

    /// Creates a ModelUnavailable error carrying the HTTP status and
    /// whether the collaborator considers the failure transient
    pub fn model_unavailable_with_status(
        message: impl Into<String>,
        status_code: u16,
        is_retryable: bool,
    ) -> Self {
        Self::ModelUnavailable {
            message: message.into(),
            status_code: Some(status_code),
            is_retryable,
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an InvalidInput error
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if this is a ModelUnavailable error
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, Self::ModelUnavailable { .. })
    }

    /// Check if this is a Cancelled error
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for WhispererError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for WhispererError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (transitional, for boundary collaborators)
impl From<anyhow::Error> for WhispererError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, WhispererError>`.
pub type Result<T> = std::result::Result<T, WhispererError>;
