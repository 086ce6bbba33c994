//! Error types for the mpesa library

use thiserror::Error;

/// Result type alias for mpesa operations
pub type Result<T> = std::result::Result<T, MpesaError>;

/// Main error type for mpesa operations
///
/// Gateway-level failures (a `ResponseCode` or `errorCode` in the body) are not
/// represented here: operations return the raw body and leave it to the caller.
#[derive(Error, Debug)]
pub enum MpesaError {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport or body read error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No usable access token: the token request failed, was rejected or was undecodable
    #[error("Authentication failed{}: {message}", status_suffix(.status))]
    Authentication {
        status: Option<u16>,
        message: String,
    },

    /// A header name or value could not be encoded
    #[error("Invalid header: {message}")]
    InvalidHeader { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|status| format!(" with status {}", status))
        .unwrap_or_default()
}

impl MpesaError {
    /// Create an authentication error without an HTTP status
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            status: None,
            message: message.into(),
        }
    }

    /// Create an authentication error for a rejected token request
    pub fn authentication_rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Authentication {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create an invalid header error
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error came from the token request
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
