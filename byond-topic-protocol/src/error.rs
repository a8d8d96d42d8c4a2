//! Protocol error types.

use thiserror::Error;

/// Errors raised while decoding a reply or parsing protocol values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The server sent nothing back. Usually it does not handle the topic.
    #[error("empty response: server sent no data for the topic")]
    EmptyResponse,

    #[error("unknown response encoding: expected 0x2a or 0x06, got {0:#04x}")]
    UnknownResponseEncoding(u8),

    #[error("truncated response: got {len} bytes, need at least {needed}")]
    TruncatedResponse { len: usize, needed: usize },

    #[error("unknown response kind: {0} (expected none, any, float or string)")]
    UnknownResponseKind(String),
}
