//! Encoder for topic requests and decoder for server replies.

use crate::charset;
use crate::error::ProtocolError;
use crate::frame::{RequestFrame, ResponseHeader, RESPONSE_HEADER_SIZE};
use crate::message::{ResponseKind, WireResponse};
use crate::TOPIC_PREFIX;
use bytes::BytesMut;
use std::borrow::Cow;

/// Size of a float payload.
const FLOAT_SIZE: usize = 4;

/// Returns the topic with a leading `?`, adding one if missing.
pub fn normalize_topic(topic: &str) -> Cow<'_, str> {
    if topic.starts_with(TOPIC_PREFIX) {
        Cow::Borrowed(topic)
    } else {
        Cow::Owned(format!("{}{}", TOPIC_PREFIX, topic))
    }
}

/// Encodes topics into request frames.
pub struct Encoder;

impl Encoder {
    /// Encodes a topic into a request frame, normalizing it first.
    pub fn encode_topic(topic: &str) -> BytesMut {
        Self::frame(topic).encode()
    }

    /// Builds the request frame for a topic without encoding it.
    pub fn frame(topic: &str) -> RequestFrame {
        RequestFrame::new(&normalize_topic(topic))
    }
}

/// Decodes raw reply bytes into typed responses.
pub struct Decoder;

impl Decoder {
    /// Decodes a complete reply as read from the socket.
    ///
    /// The buffer may carry trailing bytes past the declared length; the
    /// timeout-driven read returns everything it saw.
    pub fn decode(raw: &[u8]) -> Result<WireResponse, ProtocolError> {
        if raw.is_empty() {
            return Err(ProtocolError::EmptyResponse);
        }

        let header = ResponseHeader::parse(raw)?;
        let payload = &raw[RESPONSE_HEADER_SIZE..];

        match header.kind()? {
            ResponseKind::Float => Self::decode_float(payload, raw.len()),
            _ => Ok(Self::decode_string(payload)),
        }
    }

    fn decode_float(payload: &[u8], raw_len: usize) -> Result<WireResponse, ProtocolError> {
        let bytes: [u8; FLOAT_SIZE] = payload
            .get(..FLOAT_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(ProtocolError::TruncatedResponse {
                len: raw_len,
                needed: RESPONSE_HEADER_SIZE + FLOAT_SIZE,
            })?;
        Ok(WireResponse::Float(f32::from_le_bytes(bytes)))
    }

    fn decode_string(payload: &[u8]) -> WireResponse {
        let text = charset::decode(payload);
        let trimmed = text.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
        WireResponse::String(trimmed.to_string())
    }
}
