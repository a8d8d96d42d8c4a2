//! One-shot transport sessions.
//!
//! A session owns a single TCP connection for a single topic:
//! `Created -> Connected -> Sent -> Read -> Closed`. Every path ends in
//! `Closed`; [`TransportSession::communicate`] closes on success and on
//! error, and dropping an open session closes the socket too.

use crate::address::ServerAddress;
use crate::error::ClientError;
use crate::read::ReadStrategy;
use bytes::BytesMut;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Default read timeout (1 second).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on a timeout-driven read (10 000 bytes).
pub const DEFAULT_RESPONSE_CAPACITY: usize = 10_000;

/// Largest accepted bound on a timeout-driven read (1 MiB).
pub const MAX_RESPONSE_CAPACITY: usize = 1024 * 1024;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Longest wait for a single read call.
    pub read_timeout: Duration,
    /// How the end of the reply is detected.
    pub read_strategy: ReadStrategy,
    /// Upper bound for the timeout-driven read buffer.
    pub response_capacity: usize,
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            read_strategy: ReadStrategy::default(),
            response_capacity: DEFAULT_RESPONSE_CAPACITY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read timeout. A zero timeout keeps the current one.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.read_timeout = timeout;
        }
        self
    }

    pub fn with_read_strategy(mut self, strategy: ReadStrategy) -> Self {
        self.read_strategy = strategy;
        self
    }

    /// Sets the read buffer bound, clamped to `1..=MAX_RESPONSE_CAPACITY`.
    pub fn with_response_capacity(mut self, capacity: usize) -> Self {
        self.response_capacity = capacity.clamp(1, MAX_RESPONSE_CAPACITY);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Connected,
    Sent,
    Read,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Created => write!(f, "CREATED"),
            SessionState::Connected => write!(f, "CONNECTED"),
            SessionState::Sent => write!(f, "SENT"),
            SessionState::Read => write!(f, "READ"),
            SessionState::Closed => write!(f, "CLOSED"),
        }
    }
}

/// A single request/response exchange with a server.
pub struct TransportSession {
    address: ServerAddress,
    config: SessionConfig,
    stream: Option<TcpStream>,
    state: SessionState,
}

impl TransportSession {
    /// Creates a new session (not yet connected).
    pub fn new(address: ServerAddress, config: SessionConfig) -> Self {
        Self {
            address,
            config,
            stream: None,
            state: SessionState::Created,
        }
    }

    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns whether the session still holds a socket.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Opens the session, sends `frame`, optionally reads the reply, and
    /// closes the connection whatever happened.
    pub async fn communicate(
        &mut self,
        frame: &[u8],
        read_reply: bool,
    ) -> Result<Option<BytesMut>, ClientError> {
        let result = self.exchange(frame, read_reply).await;
        self.close().await;
        result
    }

    async fn exchange(
        &mut self,
        frame: &[u8],
        read_reply: bool,
    ) -> Result<Option<BytesMut>, ClientError> {
        self.open().await?;
        self.send(frame).await?;
        if read_reply {
            Ok(Some(self.read().await?))
        } else {
            Ok(None)
        }
    }

    /// Resolves the host and connects.
    pub async fn open(&mut self) -> Result<(), ClientError> {
        self.expect_state(SessionState::Created, "open")?;
        tracing::debug!("Connecting to {}...", self.address);

        let addrs: Vec<SocketAddr> =
            match tokio::net::lookup_host((self.address.host(), self.address.port())).await {
                Ok(addrs) => addrs.collect(),
                Err(e) => {
                    tracing::debug!("Resolving {} failed: {}", self.address, e);
                    return Err(ClientError::InvalidHost(self.address.clone()));
                }
            };
        if addrs.is_empty() {
            return Err(ClientError::InvalidHost(self.address.clone()));
        }

        let stream = self.connect_any(&addrs).await?;

        // Frames are tiny, do not wait for more data before sending
        stream.set_nodelay(true).ok();

        self.stream = Some(stream);
        self.state = SessionState::Connected;
        tracing::debug!("Connected to {}", self.address);
        Ok(())
    }

    async fn connect_any(&self, addrs: &[SocketAddr]) -> Result<TcpStream, ClientError> {
        let mut last_error = None;

        for addr in addrs {
            match tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(addr)).await
            {
                Ok(Ok(stream)) => return Ok(stream),
                Ok(Err(e)) => {
                    tracing::debug!("Connection to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
                Err(_) => {
                    tracing::debug!("Connection to {} timed out", addr);
                    last_error = Some(io::Error::from(io::ErrorKind::TimedOut));
                }
            }
        }

        let address = self.address.clone();
        Err(match last_error {
            Some(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                ClientError::HostUnavailable(address)
            }
            Some(e) if e.kind() == io::ErrorKind::TimedOut => ClientError::ConnectTimeout(address),
            Some(source) => ClientError::Connect { address, source },
            None => ClientError::InvalidHost(address),
        })
    }

    /// Writes the whole frame and flushes it.
    pub async fn send(&mut self, frame: &[u8]) -> Result<(), ClientError> {
        self.expect_state(SessionState::Connected, "send")?;
        let stream = self.stream_mut("send")?;

        stream
            .write_all(frame)
            .await
            .map_err(ClientError::SendFailure)?;
        stream.flush().await.map_err(ClientError::SendFailure)?;

        self.state = SessionState::Sent;
        tracing::debug!("Sent {} bytes to {}", frame.len(), self.address);
        Ok(())
    }

    /// Reads the reply with the configured strategy.
    ///
    /// An empty buffer means the server sent nothing in time.
    pub async fn read(&mut self) -> Result<BytesMut, ClientError> {
        self.expect_state(SessionState::Sent, "read")?;
        let strategy = self.config.read_strategy;
        let timeout = self.config.read_timeout;
        let capacity = self.config.response_capacity;

        let stream = self.stream_mut("read")?;
        let buf = strategy.read(stream, timeout, capacity).await?;

        self.state = SessionState::Read;
        tracing::debug!(
            "Read {} bytes from {} ({})",
            buf.len(),
            self.address,
            strategy
        );
        Ok(buf)
    }

    /// Closes the connection. Safe to call in any state, any number of times.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                tracing::debug!("Shutdown of {} failed: {}", self.address, e);
            }
            tracing::debug!("Closed connection to {}", self.address);
        }
        self.state = SessionState::Closed;
    }

    fn expect_state(
        &self,
        expected: SessionState,
        operation: &'static str,
    ) -> Result<(), ClientError> {
        if self.state != expected {
            return Err(ClientError::InvalidState {
                state: self.state,
                operation,
            });
        }
        Ok(())
    }

    fn stream_mut(&mut self, operation: &'static str) -> Result<&mut TcpStream, ClientError> {
        let state = self.state;
        self.stream
            .as_mut()
            .ok_or(ClientError::InvalidState { state, operation })
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Session to {} dropped while open, socket closed", self.address);
        }
    }
}
