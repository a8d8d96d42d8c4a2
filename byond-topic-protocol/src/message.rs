//! Response kinds and decoded replies.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a caller expects back, and what a decoded reply turned out to be.
///
/// `None` and `Any` only make sense as expectations: `None` skips the read
/// entirely, `Any` accepts whatever comes back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseKind {
    None,
    #[default]
    Any,
    Float,
    String,
}

impl ResponseKind {
    /// Returns whether a reply has to be read for this expectation.
    pub fn expects_reply(&self) -> bool {
        !matches!(self, ResponseKind::None)
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseKind::None => write!(f, "NONE"),
            ResponseKind::Any => write!(f, "ANY"),
            ResponseKind::Float => write!(f, "FLOAT"),
            ResponseKind::String => write!(f, "STRING"),
        }
    }
}

impl FromStr for ResponseKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(ResponseKind::None),
            "any" => Ok(ResponseKind::Any),
            "float" => Ok(ResponseKind::Float),
            "string" => Ok(ResponseKind::String),
            _ => Err(ProtocolError::UnknownResponseKind(s.to_string())),
        }
    }
}

/// A reply from the server.
///
/// `Float` and `String` are only produced by [`Decoder::decode`](crate::Decoder::decode).
/// `None` stands for "nothing was read" and is what a fire-and-forget call returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WireResponse {
    None,
    Float(f32),
    String(String),
}

impl WireResponse {
    /// Returns the kind of this reply.
    pub fn kind(&self) -> ResponseKind {
        match self {
            WireResponse::None => ResponseKind::None,
            WireResponse::Float(_) => ResponseKind::Float,
            WireResponse::String(_) => ResponseKind::String,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            WireResponse::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireResponse::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, WireResponse::None)
    }
}

impl fmt::Display for WireResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireResponse::None => Ok(()),
            WireResponse::Float(value) => write!(f, "{}", value),
            WireResponse::String(value) => write!(f, "{}", value),
        }
    }
}
