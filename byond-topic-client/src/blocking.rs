//! Blocking wrapper around [`crate::Client`].
//!
//! Runs each call to completion on a private current-thread runtime. Do not
//! use it from inside an async context; call the async client there instead.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::message::OutboundMessage;
use byond_topic_protocol::WireResponse;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Blocking client for BYOND servers.
pub struct Client {
    inner: crate::Client,
    runtime: Runtime,
}

impl Client {
    /// Creates a blocking client and its runtime.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClientError::Runtime)?;

        Ok(Self {
            inner: crate::Client::new(config),
            runtime,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.config()
    }

    /// Sends a topic without waiting for a reply.
    pub fn send_command(&self, message: OutboundMessage) -> Result<(), ClientError> {
        self.runtime.block_on(self.inner.send_command(message))
    }

    /// Sends a topic and returns the reply.
    pub fn send_message(&self, message: &OutboundMessage) -> Result<WireResponse, ClientError> {
        self.runtime.block_on(self.inner.send_message(message))
    }

    /// Sends a topic and reads until the server stays silent for `timeout`.
    pub fn send_message_with_timeout(
        &self,
        message: &OutboundMessage,
        timeout: Duration,
    ) -> Result<WireResponse, ClientError> {
        self.runtime
            .block_on(self.inner.send_message_with_timeout(message, timeout))
    }
}
