// SPDX-License-Identifier: MIT

//! Wire codec for the client protocol.
//!
//! Two framings of the same JSON document model, auto-detected per
//! message from its first byte and mirrored per session on the way out:
//!
//! - `Json`: one document per newline-terminated line
//! - `Framed`: 4-byte length prefix (big-endian) + JSON payload
//!
//! The framings are self-describing: a frame's length prefix for any
//! message under the size cap starts with a byte below 0x09, and a JSON
//! document never does once inter-message whitespace is skipped.

use serde_json::Value;
use thiserror::Error;

/// Maximum message size (100 MB). The cap keeps a frame's first length
/// byte below the ASCII whitespace range, so framing detection never
/// mistakes a length prefix for inter-message whitespace.
pub const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// How a message was framed on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WireFormat {
    #[default]
    Json,
    Framed,
}

/// Errors from encoding an outbound document.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A malformed inbound message. `position` is the byte offset into the
/// session's inbound stream where decoding failed.
#[derive(Debug, Error)]
#[error("invalid json at position {position}: {reason}")]
pub struct DecodeError {
    pub position: u64,
    pub reason: String,
}

/// Incremental decoder holding per-session buffer state across reads.
#[derive(Debug, Default)]
pub struct Decoder {
    buf: Vec<u8>,
    /// Total bytes consumed from the stream so far, for error positions.
    consumed: u64,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder::default()
    }

    /// Append freshly read bytes to the buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Try to decode the next complete message. `Ok(None)` means more
    /// bytes are needed.
    pub fn next_request(&mut self) -> Result<Option<(Value, WireFormat)>, DecodeError> {
        self.skip_whitespace();
        let Some(&first) = self.buf.first() else {
            return Ok(None);
        };

        if first < 0x20 {
            self.next_framed()
        } else {
            self.next_line()
        }
    }

    fn skip_whitespace(&mut self) {
        let skip = self
            .buf
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        if skip > 0 {
            self.advance(skip);
        }
    }

    fn next_framed(&mut self) -> Result<Option<(Value, WireFormat)>, DecodeError> {
        if self.buf.len() < 4 {
            return Ok(None);
        }
        let len = u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(DecodeError {
                position: self.consumed,
                reason: format!("message too large: {} bytes (max {})", len, MAX_MESSAGE_SIZE),
            });
        }
        if self.buf.len() < 4 + len {
            return Ok(None);
        }

        let value = self.parse(4, 4 + len)?;
        self.advance(4 + len);
        Ok(Some((value, WireFormat::Framed)))
    }

    fn next_line(&mut self) -> Result<Option<(Value, WireFormat)>, DecodeError> {
        let Some(newline) = self.buf.iter().position(|&b| b == b'\n') else {
            if self.buf.len() > MAX_MESSAGE_SIZE {
                return Err(DecodeError {
                    position: self.consumed,
                    reason: format!(
                        "message too large: over {} buffered bytes without a newline",
                        MAX_MESSAGE_SIZE
                    ),
                });
            }
            return Ok(None);
        };

        let value = self.parse(0, newline)?;
        self.advance(newline + 1);
        Ok(Some((value, WireFormat::Json)))
    }

    fn parse(&self, start: usize, end: usize) -> Result<Value, DecodeError> {
        serde_json::from_slice(&self.buf[start..end]).map_err(|e| DecodeError {
            position: self.consumed + start as u64 + e.column().saturating_sub(1) as u64,
            reason: e.to_string(),
        })
    }

    fn advance(&mut self, n: usize) {
        self.buf.drain(..n);
        self.consumed += n as u64;
    }
}

/// Encode an outbound document in the session's mirrored format.
pub fn encode(value: &Value, format: WireFormat) -> Result<Vec<u8>, WireError> {
    let mut payload = serde_json::to_vec(value)?;
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(WireError::MessageTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    match format {
        WireFormat::Json => {
            payload.push(b'\n');
            Ok(payload)
        }
        WireFormat::Framed => {
            let mut out = Vec::with_capacity(payload.len() + 4);
            out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            out.extend_from_slice(&payload);
            Ok(out)
        }
    }
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
