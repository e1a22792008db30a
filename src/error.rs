//! Error types for the keyvalue client

use std::io;
use thiserror::Error;

/// Errors that can occur when talking to the keyvalue service
#[derive(Error, Debug)]
pub enum Error {
    /// Connection, TLS handshake or I/O failure while sending a request
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service did not answer within the response timeout
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// The service answered with a status other than 200
    #[error("Request error: {status} {reason}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase for the status
        reason: String,
    },

    /// The creation endpoint answered with something that is not `.../<token>/<key>`
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A value could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A read-back after a write did not match what was written
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Base URL or request URI is not usable
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// TLS configuration error
    #[error("TLS error: {0}")]
    Tls(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true for failures that happened before a status line was received
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_) | Error::Io(_))
    }

    /// Returns true if the service answered with a non-success status
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Remote { .. })
    }

    /// HTTP status of a [`Error::Remote`] failure
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;
