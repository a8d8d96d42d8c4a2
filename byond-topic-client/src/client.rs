//! High-level client API.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::message::OutboundMessage;
use crate::read::ReadStrategy;
use crate::reconcile;
use crate::session::{SessionConfig, TransportSession};
use byond_topic_protocol::{Decoder, Encoder, ResponseKind, WireResponse};
use std::time::Duration;

/// High-level client for BYOND servers.
///
/// Every call opens its own connection and closes it before returning, so
/// a `Client` holds no sockets and can be shared freely.
///
/// ```no_run
/// # async fn demo() -> Result<(), byond_topic_client::ClientError> {
/// use byond_topic_client::{Client, ClientConfig, OutboundMessage, ServerAddress};
///
/// let client = Client::new(ClientConfig::default());
/// let address = ServerAddress::new("bagil.game.tgstation13.org", 2337);
/// let reply = client.send_message(&OutboundMessage::new(address, "ping")).await?;
/// println!("{}", reply);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    /// Creates a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends a topic without waiting for a reply.
    pub async fn send_command(&self, message: OutboundMessage) -> Result<(), ClientError> {
        let message = message.with_expected(ResponseKind::None);
        self.dispatch(&message, self.config.session_config())
            .await
            .map(|_| ())
    }

    /// Sends a topic and returns the reply.
    ///
    /// Uses the configured read strategy and timeout. When the message
    /// expects [`ResponseKind::None`] nothing is read and
    /// [`WireResponse::None`] is returned.
    pub async fn send_message(&self, message: &OutboundMessage) -> Result<WireResponse, ClientError> {
        self.dispatch(message, self.config.session_config()).await
    }

    /// Sends a topic and reads until the server stays silent for `timeout`.
    ///
    /// Every call waits at least `timeout`, and a timeout shorter than the
    /// server's think time cuts the reply short. A zero timeout behaves like
    /// [`send_message`](Self::send_message).
    pub async fn send_message_with_timeout(
        &self,
        message: &OutboundMessage,
        timeout: Duration,
    ) -> Result<WireResponse, ClientError> {
        let session_config = if timeout.is_zero() {
            self.config.session_config()
        } else {
            self.config
                .session_config()
                .with_read_strategy(ReadStrategy::UntilTimeout)
                .with_read_timeout(timeout)
        };
        self.dispatch(message, session_config).await
    }

    async fn dispatch(
        &self,
        message: &OutboundMessage,
        session_config: SessionConfig,
    ) -> Result<WireResponse, ClientError> {
        let topic = message.as_topic();
        let expected = message.expected();
        let frame = Encoder::encode_topic(&topic);

        tracing::debug!(
            "Sending topic {:?} to {} (expecting {})",
            topic,
            message.address(),
            expected
        );

        let mut session = TransportSession::new(message.address().clone(), session_config);
        let raw = session.communicate(&frame, expected.expects_reply()).await?;

        let Some(raw) = raw else {
            return Ok(WireResponse::None);
        };

        let response = Decoder::decode(&raw)?;
        reconcile::check(expected, response.kind())?;

        tracing::debug!("Topic {:?} answered with {}", topic, response.kind());
        Ok(response)
    }
}
