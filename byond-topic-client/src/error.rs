//! Client error types.

use crate::address::ServerAddress;
use crate::session::SessionState;
use byond_topic_protocol::{ProtocolError, ResponseKind};
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unknown host {0}: check the host name and port")]
    InvalidHost(ServerAddress),

    #[error("cannot connect to {0}: connection refused, the server is probably offline")]
    HostUnavailable(ServerAddress),

    #[error("connect to {0} timed out")]
    ConnectTimeout(ServerAddress),

    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: ServerAddress,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to send topic: {0}")]
    SendFailure(#[source] std::io::Error),

    #[error("failed to read response: {0}")]
    ReadFailure(#[source] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("unexpected response type: expected {expected}, got {actual}")]
    UnexpectedResponseType {
        expected: ResponseKind,
        actual: ResponseKind,
    },

    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        state: SessionState,
        operation: &'static str,
    },

    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl ClientError {
    /// Returns whether the server sent nothing back.
    pub fn is_empty_response(&self) -> bool {
        matches!(self, ClientError::Protocol(ProtocolError::EmptyResponse))
    }

    /// Returns whether the error happened before any byte was sent.
    pub fn is_connect_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidHost(_)
                | ClientError::HostUnavailable(_)
                | ClientError::ConnectTimeout(_)
                | ClientError::Connect { .. }
        )
    }
}
