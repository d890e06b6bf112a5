//! Error types and handling for the JIRA ticket server
//!
//! Provides structured error types that map to MCP JSON-RPC error codes.
//! Configuration and validation errors abort an operation before any network
//! call; remote-side errors are folded into the operation result envelope by
//! the service layer.

use serde_json::Value;
use thiserror::Error;

/// Custom error types for the JIRA ticket server
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Missing or malformed configuration (-32001)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Caller input rejected before any remote call (-32006)
    #[error("Invalid parameter: {parameter} - {message}")]
    Validation { parameter: String, message: String },

    /// Non-2xx response from JIRA (-32003)
    #[error("HTTP error occurred: {status} {reason}\nResponse: {body}")]
    RemoteHttp {
        status: u16,
        reason: String,
        body: String,
    },

    /// Connection or protocol failure below HTTP (-32003)
    #[error("An error occurred: {message}")]
    Transport { message: String },

    /// The per-call timeout elapsed (-32008)
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// The caller cancelled the invocation (-32009)
    #[error("Request cancelled before completion")]
    Cancelled,

    /// No workflow transition leads to the requested status (-32005)
    #[error("No transition to status '{status}' is available for issue {issue_key}")]
    TransitionNotFound {
        issue_key: String,
        status: String,
        available: Vec<String>,
    },

    /// Payload encoding/decoding errors (-32603)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Internal server errors (-32603)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TrackerError {
    /// Get the MCP JSON-RPC error code for this error
    pub fn error_code(&self) -> i32 {
        match self {
            TrackerError::Configuration { .. } => -32001,
            TrackerError::Validation { .. } => -32006,
            TrackerError::RemoteHttp { status, .. } => match status {
                401 => -32002,
                403 => -32004,
                404 => -32005,
                429 => -32007,
                _ => -32003,
            },
            TrackerError::Transport { .. } => -32003,
            TrackerError::Timeout { .. } => -32008,
            TrackerError::Cancelled => -32009,
            TrackerError::TransitionNotFound { .. } => -32005,
            TrackerError::Serialization { .. } => -32603,
            TrackerError::Internal { .. } => -32603,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            TrackerError::Configuration { .. } => "configuration",
            TrackerError::Validation { .. } => "validation",
            TrackerError::RemoteHttp { .. } => "remote_http",
            TrackerError::Transport { .. } => "transport",
            TrackerError::Timeout { .. } => "timeout",
            TrackerError::Cancelled => "cancelled",
            TrackerError::TransitionNotFound { .. } => "transition_not_found",
            TrackerError::Serialization { .. } => "serialization",
            TrackerError::Internal { .. } => "internal",
        }
    }

    /// True for errors that abort an operation instead of producing a failed envelope
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TrackerError::Configuration { .. } | TrackerError::Validation { .. }
        )
    }

    /// Get additional error data for MCP error responses
    pub fn error_data(&self) -> Option<Value> {
        let mut data = serde_json::Map::new();
        data.insert(
            "category".to_string(),
            Value::String(self.category().to_string()),
        );

        match self {
            TrackerError::RemoteHttp { status, .. } => {
                data.insert("status".to_string(), Value::Number((*status).into()));
            }
            TrackerError::Validation { parameter, .. } => {
                data.insert("parameter".to_string(), Value::String(parameter.clone()));
            }
            TrackerError::Timeout { seconds } => {
                data.insert("timeout_seconds".to_string(), Value::Number((*seconds).into()));
            }
            TrackerError::TransitionNotFound {
                issue_key,
                status,
                available,
            } => {
                data.insert("issue_key".to_string(), Value::String(issue_key.clone()));
                data.insert("status".to_string(), Value::String(status.clone()));
                data.insert(
                    "available".to_string(),
                    Value::Array(available.iter().cloned().map(Value::String).collect()),
                );
            }
            _ => {}
        }

        Some(Value::Object(data))
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        TrackerError::Configuration {
            message: message.into(),
        }
    }

    /// Create a validation error for a caller-supplied parameter
    pub fn invalid_param(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        TrackerError::Validation {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a remote HTTP error
    pub fn remote(status: u16, reason: impl Into<String>, body: impl Into<String>) -> Self {
        TrackerError::RemoteHttp {
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        TrackerError::Transport {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        TrackerError::Internal {
            message: message.into(),
        }
    }
}

/// Convert from reqwest errors
impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TrackerError::Serialization {
                message: format!("Failed to decode JIRA response: {}", err),
            }
        } else {
            TrackerError::transport(err.to_string())
        }
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Serialization {
            message: format!("JSON error: {}", err),
        }
    }
}

/// Convert from TOML parsing errors
impl From<toml::de::Error> for TrackerError {
    fn from(err: toml::de::Error) -> Self {
        TrackerError::config(format!("TOML parsing error: {}", err))
    }
}

/// Convert from generic anyhow errors
impl From<anyhow::Error> for TrackerError {
    fn from(err: anyhow::Error) -> Self {
        let message = err.to_string();
        if message.to_lowercase().contains("config") {
            TrackerError::config(message)
        } else {
            TrackerError::internal(message)
        }
    }
}

/// Result type alias for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;
