//! MLLP (Minimal Lower Layer Protocol) implementation
//!
//! This crate provides the byte framing used to exchange HL7 v2 messages over a
//! raw TCP stream, together with a concurrent listener and a one-shot sender.
//!
//! # Features
//! - Pure frame encode/decode plus a `tokio_util` codec
//! - Inbound listener: one task per connection, MLLP acknowledgements, bounded buffers
//! - Outbound sender: connect timeout, optional TLS (feature = "tls")
//! - Minimal HL7 acknowledgement builder

pub mod ack;
pub mod codec;
pub mod config;
pub mod error;
pub mod listener;
pub mod sender;

#[cfg(feature = "tls")]
pub mod tls;

// Re-export commonly used types
pub use codec::{decode, decode_frame, encode, MllpCodec};
pub use config::{CharacterEncoding, ListenerConfig, SenderConfig};
pub use error::{MllpError, Result};
pub use listener::{ListenerEvent, ListenerHandle, MllpListener};
pub use sender::{MllpSender, SendReport};

/// Start of block marker
pub const START_BLOCK: u8 = 0x0B;

/// End of block marker, always followed by [`CARRIAGE_RETURN`]
pub const END_BLOCK: u8 = 0x1C;

/// Segment terminator inside a frame and final byte of every frame
pub const CARRIAGE_RETURN: u8 = 0x0D;

/// Default MLLP port
pub const DEFAULT_MLLP_PORT: u16 = 2575;

/// Default cap on bytes buffered for a single connection without a complete frame
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024 * 1024;
