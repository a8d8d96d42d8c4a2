//! # byond-topic-protocol
//!
//! Wire protocol implementation for the BYOND world topic protocol.
//!
//! This crate provides:
//! - Request frame encoding for topic strings
//! - Response frame decoding into typed replies (float or string)
//! - The CP1251 code page used for topics and string replies
//! - Response kinds and protocol error types
//!
//! Nothing in here touches a socket; see `byond-topic-client` for that.

pub mod charset;
pub mod codec;
pub mod error;
pub mod frame;
pub mod message;

pub use codec::{normalize_topic, Decoder, Encoder};
pub use error::ProtocolError;
pub use frame::{RequestFrame, ResponseHeader, REQUEST_HEADER_SIZE, RESPONSE_HEADER_SIZE};
pub use message::{ResponseKind, WireResponse};

/// Every topic sent to a server starts with this character.
pub const TOPIC_PREFIX: char = '?';

/// Longest encoded topic whose size byte does not wrap around.
pub const MAX_UNWRAPPED_TOPIC_LEN: usize = 249;
