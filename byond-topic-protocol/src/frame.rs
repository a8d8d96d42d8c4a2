//! Binary frame layouts.
//!
//! Request frame (9 bytes header + topic + terminator):
//!
//! ```text
//! +------+------+------+------+-------------+---------+------+
//! | 0x00 | 0x83 | 0x00 | size | 5 x 0x00    | topic   | 0x00 |
//! |  1   |  1   |  1   |  1   |  5 bytes    | N bytes |  1   |
//! +------+------+------+------+-------------+---------+------+
//! ```
//!
//! `size` is `(N + 6) mod 256`. It is a single byte, so topics longer than
//! 249 bytes wrap around. Servers expect the wrapped value.
//!
//! Response frame (5 bytes header + payload):
//!
//! ```text
//! +------+------+-------------------+------+---------------------+
//! | 0x00 | 0x83 | declared_len (BE) | tag  | payload             |
//! |  1   |  1   |  2 bytes          |  1   | declared_len - 1    |
//! +------+------+-------------------+------+---------------------+
//! ```
//!
//! `declared_len` counts the tag byte. Float payloads are little-endian, even
//! though the length field is big-endian.

use crate::charset;
use crate::error::ProtocolError;
use crate::message::ResponseKind;
use crate::MAX_UNWRAPPED_TOPIC_LEN;
use bytes::{BufMut, Bytes, BytesMut};

/// Size of the fixed request header in bytes.
pub const REQUEST_HEADER_SIZE: usize = 9;

/// Size of the fixed response header in bytes.
pub const RESPONSE_HEADER_SIZE: usize = 5;

/// Second byte of every frame.
pub const FRAME_MARKER: u8 = 0x83;

/// Response tag for float replies.
pub const TAG_FLOAT: u8 = 0x2a;

/// Response tag for string replies.
pub const TAG_STRING: u8 = 0x06;

/// The size byte counts the topic plus this many bytes.
const SIZE_OVERHEAD: usize = 6;

/// A request frame ready to be written to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    /// Topic bytes in CP1251, without the terminator.
    pub topic: Bytes,
}

impl RequestFrame {
    /// Creates a frame from an already normalized topic string.
    pub fn new(topic: &str) -> Self {
        Self {
            topic: Bytes::from(charset::encode(topic)),
        }
    }

    /// Returns the size byte as it goes on the wire, wrapped modulo 256.
    pub fn size_byte(&self) -> u8 {
        ((self.topic.len() + SIZE_OVERHEAD) % 256) as u8
    }

    /// Returns whether the size byte wrapped around for this topic.
    pub fn size_wraps(&self) -> bool {
        self.topic.len() > MAX_UNWRAPPED_TOPIC_LEN
    }

    /// Total frame length in bytes.
    pub fn encoded_len(&self) -> usize {
        REQUEST_HEADER_SIZE + self.topic.len() + 1
    }

    /// Encodes the frame into bytes.
    pub fn encode(&self) -> BytesMut {
        if self.size_wraps() {
            tracing::warn!(
                "topic is {} bytes, size byte wraps to {} (max {} without wrapping)",
                self.topic.len(),
                self.size_byte(),
                MAX_UNWRAPPED_TOPIC_LEN
            );
        }

        let mut buf = BytesMut::with_capacity(self.encoded_len());

        // Marker and size (4 bytes)
        buf.put_u8(0x00);
        buf.put_u8(FRAME_MARKER);
        buf.put_u8(0x00);
        buf.put_u8(self.size_byte());

        // Padding (5 bytes)
        buf.put_bytes(0x00, 5);

        // Topic and terminator
        buf.put_slice(&self.topic);
        buf.put_u8(0x00);

        buf
    }
}

/// The fixed header at the start of every response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Length field at offsets 2..4, big-endian. Includes the tag byte.
    pub declared_len: u16,
    /// Type tag at offset 4.
    pub tag: u8,
}

impl ResponseHeader {
    /// Parses the header from the start of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < RESPONSE_HEADER_SIZE {
            return Err(ProtocolError::TruncatedResponse {
                len: buf.len(),
                needed: RESPONSE_HEADER_SIZE,
            });
        }

        Ok(Self {
            declared_len: u16::from_be_bytes([buf[2], buf[3]]),
            tag: buf[4],
        })
    }

    /// Number of payload bytes that follow the header.
    pub fn payload_len(&self) -> usize {
        self.declared_len.saturating_sub(1) as usize
    }

    /// Maps the tag byte to a response kind.
    pub fn kind(&self) -> Result<ResponseKind, ProtocolError> {
        match self.tag {
            TAG_FLOAT => Ok(ResponseKind::Float),
            TAG_STRING => Ok(ResponseKind::String),
            other => Err(ProtocolError::UnknownResponseEncoding(other)),
        }
    }
}
