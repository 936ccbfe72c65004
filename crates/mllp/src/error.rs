//! Error types for MLLP operations

use std::time::Duration;

use thiserror::Error;

/// Result type alias for MLLP operations
pub type Result<T> = std::result::Result<T, MllpError>;

/// Error types that can occur while framing, sending or receiving messages
#[derive(Error, Debug)]
pub enum MllpError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out after {timeout:?} connecting to {addr}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS handshake with {addr} failed: {reason}")]
    TlsHandshake { addr: String, reason: String },

    #[error("Failed to write message: {0}")]
    Write(#[source] std::io::Error),

    #[error("Timeout occurred: {0}")]
    Timeout(String),

    #[error("Frame exceeded {limit} pending bytes without an end-of-block marker")]
    BufferOverflow { limit: usize },

    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("Operation not supported: {0}")]
    NotSupported(String),
}

impl MllpError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new TLS handshake error
    pub fn tls(addr: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::TlsHandshake {
            addr: addr.into(),
            reason: reason.to_string(),
        }
    }
}
