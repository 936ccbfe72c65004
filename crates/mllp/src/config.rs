//! Configuration types for the MLLP listener and sender

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{MllpError, Result};
use crate::{DEFAULT_MAX_FRAME_LEN, DEFAULT_MLLP_PORT};

/// Configuration for an inbound MLLP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Bind address for the listening socket
    #[serde(default = "default_bind_addr")]
    pub bind_addr: IpAddr,

    /// TCP port to listen on (0 picks an ephemeral port)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum bytes buffered per connection while waiting for an end-of-block marker
    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,

    /// Capacity of the channel that surfaces received messages
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Configuration for an outbound MLLP sender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Remote host name or address
    pub host: String,

    /// Remote port
    pub port: u16,

    /// Timeout for the whole send in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Upgrade the connection to TLS
    #[serde(default)]
    pub use_tls: bool,

    /// Accept any server certificate. Only honoured when `use_tls` is set.
    #[serde(default)]
    pub ignore_cert_error: bool,

    /// Character encoding used to turn the message text into bytes
    #[serde(default)]
    pub encoding: CharacterEncoding,
}

/// Character encodings supported when writing a message to the socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterEncoding {
    #[default]
    #[serde(alias = "utf-8")]
    Utf8,
    #[serde(alias = "iso-8859-1", alias = "latin-1")]
    Latin1,
    #[serde(alias = "us-ascii")]
    Ascii,
}

impl CharacterEncoding {
    /// Encode text, replacing characters outside the character set with `?`
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            CharacterEncoding::Utf8 => text.as_bytes().to_vec(),
            CharacterEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            CharacterEncoding::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }

    /// Decode bytes received on the wire
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            CharacterEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            CharacterEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            CharacterEncoding::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { '?' })
                .collect(),
        }
    }
}

impl FromStr for CharacterEncoding {
    type Err = MllpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(CharacterEncoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(CharacterEncoding::Latin1),
            "ascii" | "us-ascii" => Ok(CharacterEncoding::Ascii),
            other => Err(MllpError::config(format!(
                "Unsupported character encoding '{}'",
                other
            ))),
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            max_frame_len: default_max_frame_len(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl ListenerConfig {
    /// Create a listener configuration for the given port on all interfaces
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_len == 0 {
            return Err(MllpError::config("max_frame_len must be greater than 0"));
        }

        if self.event_capacity == 0 {
            return Err(MllpError::config("event_capacity must be greater than 0"));
        }

        Ok(())
    }
}

impl SenderConfig {
    /// Create a new sender configuration
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout_ms: default_timeout(),
            use_tls: false,
            ignore_cert_error: false,
            encoding: CharacterEncoding::default(),
        }
    }

    /// Enable TLS for this sender
    pub fn with_tls(mut self, ignore_cert_error: bool) -> Self {
        self.use_tls = true;
        self.ignore_cert_error = ignore_cert_error;
        self
    }

    /// Set the send timeout
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Override host and/or port, keeping every other setting
    pub fn with_address(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// Set the character encoding
    pub fn with_encoding(mut self, encoding: CharacterEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Get the timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `host:port` as used for connecting and in error messages
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the sender configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(MllpError::config("Remote host cannot be empty"));
        }

        if self.port == 0 {
            return Err(MllpError::config("Remote port must be greater than 0"));
        }

        if self.timeout_ms == 0 {
            return Err(MllpError::config("Timeout must be greater than 0"));
        }

        Ok(())
    }
}

// Default value functions
fn default_bind_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    DEFAULT_MLLP_PORT
}

fn default_max_frame_len() -> usize {
    DEFAULT_MAX_FRAME_LEN
}

fn default_event_capacity() -> usize {
    256
}

fn default_timeout() -> u64 {
    5_000
}
