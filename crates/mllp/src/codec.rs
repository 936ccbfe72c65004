//! MLLP frame encoding and incremental decoding
//!
//! A frame is `0x0B` + payload + `0x1C 0x0D`. Decoding works on a growing
//! buffer: complete frames are split off the front, bytes preceding a start
//! marker are discarded as noise, and a partial frame is left in place until
//! more bytes arrive.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::MllpError;
use crate::{CARRIAGE_RETURN, DEFAULT_MAX_FRAME_LEN, END_BLOCK, START_BLOCK};

/// Wrap a payload in an MLLP frame
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 3);
    frame.push(START_BLOCK);
    frame.extend_from_slice(payload);
    frame.push(END_BLOCK);
    frame.push(CARRIAGE_RETURN);
    frame
}

/// Split the first complete frame off the front of `buffer`.
///
/// Returns `None` when no complete frame is available yet. Bytes before the
/// first start marker are dropped; a buffer without any start marker is cleared.
pub fn decode_frame(buffer: &mut BytesMut) -> Option<Bytes> {
    let Some(start) = buffer.iter().position(|&b| b == START_BLOCK) else {
        buffer.clear();
        return None;
    };

    if start > 0 {
        buffer.advance(start);
    }

    let end = find_end_block(&buffer[1..])? + 1;
    let mut frame = buffer.split_to(end + 2);
    frame.advance(1);
    frame.truncate(end - 1);
    Some(frame.freeze())
}

/// Split every complete frame off the front of `buffer`, in arrival order
pub fn decode(buffer: &mut BytesMut) -> Vec<Bytes> {
    let mut messages = Vec::new();
    while let Some(message) = decode_frame(buffer) {
        messages.push(message);
    }
    messages
}

/// Position of the `0x1C 0x0D` pair within `bytes`
fn find_end_block(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(2)
        .position(|pair| pair[0] == END_BLOCK && pair[1] == CARRIAGE_RETURN)
}

/// `tokio_util` codec producing one item per MLLP frame
#[derive(Debug, Clone)]
pub struct MllpCodec {
    max_frame_len: usize,
}

impl MllpCodec {
    /// Create a codec with the default pending-byte cap
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Create a codec that fails once more than `max_frame_len` bytes are
    /// pending without a terminator
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }
}

impl Default for MllpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MllpCodec {
    type Item = Bytes;
    type Error = MllpError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = decode_frame(src) {
            return Ok(Some(frame));
        }

        if src.len() > self.max_frame_len {
            let limit = self.max_frame_len;
            src.clear();
            return Err(MllpError::BufferOverflow { limit });
        }

        Ok(None)
    }
}

impl Encoder<Bytes> for MllpCodec {
    type Error = MllpError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len() + 3);
        dst.extend_from_slice(&[START_BLOCK]);
        dst.extend_from_slice(&item);
        dst.extend_from_slice(&[END_BLOCK, CARRIAGE_RETURN]);
        Ok(())
    }
}
