//! Outbound topic messages.

use crate::address::ServerAddress;
use byond_topic_protocol::{normalize_topic, ResponseKind};
use std::borrow::Cow;

/// A topic to send, where to send it, and what reply the caller expects.
///
/// The topic behaves like an HTTP query string: several parameters can be
/// sent at once, separated with `;` or `&` (for example `ping&data=123`).
/// The leading `?` is optional; it is added at encode time when missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    address: ServerAddress,
    topic: String,
    expected: ResponseKind,
}

impl OutboundMessage {
    /// Creates a message that accepts any reply.
    pub fn new(address: ServerAddress, topic: impl Into<String>) -> Self {
        Self {
            address,
            topic: topic.into(),
            expected: ResponseKind::Any,
        }
    }

    pub fn with_expected(mut self, expected: ResponseKind) -> Self {
        self.expected = expected;
        self
    }

    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    /// Returns the topic exactly as given.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the topic with its leading `?`.
    pub fn as_topic(&self) -> Cow<'_, str> {
        normalize_topic(&self.topic)
    }

    pub fn expected(&self) -> ResponseKind {
        self.expected
    }
}
