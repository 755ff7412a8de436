//! Error types for the ERPA client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed marker prefixed to every user-visible failure turn.
pub const ERROR_MARKER: &str = "❌";

const GENERIC_RETRY_MESSAGE: &str =
    "Something went wrong while contacting the server. Please try again.";
const CONNECTIVITY_MESSAGE: &str =
    "Unable to reach the server. Check your connection and try again.";
const EMPTY_BACKEND_MESSAGE: &str = "The server reported an error without details.";

/// A shared error type for the entire ERPA client.
///
/// Variants follow the failure taxonomy the chat surface reports on:
/// validation, transport, backend, malformed payload and unknown action,
/// plus the ambient configuration and serialization failures.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ErpaError {
    /// A required parameter was missing; raised before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The server could not be reached at all (refused, timed out).
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// The request reached the server but the HTTP exchange failed.
    #[error("Transport error (status {status:?}): {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The backend answered with a non-success status.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The payload did not have the expected shape.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The assistant asked for an action kind the client does not know.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// A message was submitted while another one is still in flight.
    #[error("A request is already in progress")]
    Busy,

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

impl ErpaError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Validation error for a missing parameter.
    pub fn missing_param(param: &str) -> Self {
        Self::Validation(format!("Missing required parameter: {param}"))
    }

    /// Creates a Connectivity error
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity(message.into())
    }

    /// Creates a Transport error
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Creates a Backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Creates a MalformedPayload error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload(message.into())
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

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if the server could not be reached.
    ///
    /// These failures are surfaced as a transient notice rather than an
    /// assistant turn.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }

    /// Check if this is a transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if this is a backend error
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    /// Check if this is an unknown action error
    pub fn is_unknown_action(&self) -> bool {
        matches!(self, Self::UnknownAction(_))
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Text shown to the user for this failure, without the marker.
    ///
    /// Transport details never leak into this text; callers log them.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::MalformedPayload(message) => message.clone(),
            Self::Backend(message) if message.trim().is_empty() => {
                EMPTY_BACKEND_MESSAGE.to_string()
            }
            Self::Backend(message) => message.clone(),
            Self::Connectivity(_) => CONNECTIVITY_MESSAGE.to_string(),
            Self::Transport { .. } => GENERIC_RETRY_MESSAGE.to_string(),
            Self::UnknownAction(kind) => format!("Unknown action: {kind}"),
            Self::Busy => "Please wait for the current request to finish.".to_string(),
            Self::Config(_) | Self::Serialization { .. } | Self::Io { .. } | Self::Internal(_) => {
                "An unexpected error occurred.".to_string()
            }
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ErpaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ErpaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ErpaError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ErpaError>`.
pub type Result<T> = std::result::Result<T, ErpaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_passes_through() {
        let err = ErpaError::backend("Customer CUST-9 not found");
        assert_eq!(err.user_message(), "Customer CUST-9 not found");
    }

    #[test]
    fn test_empty_backend_message_never_blank() {
        let err = ErpaError::backend("");
        assert_eq!(err.user_message(), EMPTY_BACKEND_MESSAGE);
    }

    #[test]
    fn test_transport_details_hidden() {
        let err = ErpaError::transport(Some(502), "upstream exploded at 10.0.0.3");
        assert!(!err.user_message().contains("10.0.0.3"));
        assert!(err.is_transport());
        assert!(!err.is_connectivity());
    }

    #[test]
    fn test_missing_param_is_validation() {
        let err = ErpaError::missing_param("territory");
        assert!(err.is_validation());
        assert!(err.user_message().contains("territory"));
    }
}
