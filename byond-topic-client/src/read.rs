//! Reply read strategies.
//!
//! BYOND never half-closes the stream after a reply and the frame has no
//! terminator, so "the reply is complete" has to be guessed. Two strategies
//! are available:
//!
//! - [`ReadStrategy::UntilTimeout`] keeps reading until the socket stays
//!   silent for the read timeout. Always correct, always pays one timeout.
//! - [`ReadStrategy::DeclaredLength`] trusts the length field in the reply
//!   header and reads exactly that much. Fast, but a reply that never comes
//!   still costs one timeout.
//!
//! Both return an empty buffer when the server sent nothing, which decodes
//! to an empty response error.

use crate::error::ClientError;
use byond_topic_protocol::{ResponseHeader, RESPONSE_HEADER_SIZE};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Size of the scratch buffer used by the timeout-driven read.
const READ_CHUNK_SIZE: usize = 512;

/// How the end of a reply is detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    /// Read until no data arrives for a whole read timeout.
    UntilTimeout,
    /// Read the 5-byte header, then exactly the payload it declares.
    #[default]
    DeclaredLength,
}

impl fmt::Display for ReadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadStrategy::UntilTimeout => write!(f, "until_timeout"),
            ReadStrategy::DeclaredLength => write!(f, "declared_length"),
        }
    }
}

/// Error returned for an unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown read strategy '{0}': expected until_timeout or declared_length")]
pub struct UnknownStrategy(String);

impl FromStr for ReadStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "until_timeout" => Ok(ReadStrategy::UntilTimeout),
            "declared_length" => Ok(ReadStrategy::DeclaredLength),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

impl ReadStrategy {
    /// Reads one reply from `reader`.
    ///
    /// `timeout` bounds each individual read call. `capacity` bounds the
    /// timeout-driven read; the declared-length read is bounded by the
    /// 16-bit length field.
    pub async fn read<R>(
        &self,
        reader: &mut R,
        timeout: Duration,
        capacity: usize,
    ) -> Result<BytesMut, ClientError>
    where
        R: AsyncRead + Unpin,
    {
        match self {
            ReadStrategy::UntilTimeout => read_until_timeout(reader, timeout, capacity).await,
            ReadStrategy::DeclaredLength => read_declared_length(reader, timeout).await,
        }
    }
}

async fn read_until_timeout<R>(
    reader: &mut R,
    timeout: Duration,
    capacity: usize,
) -> Result<BytesMut, ClientError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(capacity.min(READ_CHUNK_SIZE));
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        if buf.len() >= capacity {
            tracing::warn!(
                "response buffer full at {} bytes, remaining data dropped",
                capacity
            );
            break;
        }

        let want = (capacity - buf.len()).min(READ_CHUNK_SIZE);
        match tokio::time::timeout(timeout, reader.read(&mut chunk[..want])).await {
            Err(_) => {
                tracing::debug!("read went silent after {} bytes", buf.len());
                break;
            }
            Ok(Ok(0)) => {
                tracing::debug!("peer closed after {} bytes", buf.len());
                break;
            }
            Ok(Ok(n)) => buf.extend_from_slice(&chunk[..n]),
            Ok(Err(e)) => return Err(ClientError::ReadFailure(e)),
        }
    }

    Ok(buf)
}

async fn read_declared_length<R>(reader: &mut R, timeout: Duration) -> Result<BytesMut, ClientError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; RESPONSE_HEADER_SIZE];
    match fill(reader, &mut header, timeout).await? {
        Fill::Silent => {
            tracing::debug!("no response header before timeout");
            return Ok(BytesMut::new());
        }
        Fill::Eof(n) => {
            if n > 0 {
                tracing::debug!("peer closed inside response header after {} bytes", n);
            }
            return Ok(BytesMut::from(&header[..n]));
        }
        Fill::Complete => {}
    }

    // Header is complete, so parsing cannot fail
    let payload_len = ResponseHeader::parse(&header)?.payload_len();
    if payload_len == 0 {
        tracing::debug!("response declares no payload");
        return Ok(BytesMut::new());
    }

    let mut buf = BytesMut::zeroed(RESPONSE_HEADER_SIZE + payload_len);
    buf[..RESPONSE_HEADER_SIZE].copy_from_slice(&header);

    match fill(reader, &mut buf[RESPONSE_HEADER_SIZE..], timeout).await? {
        Fill::Silent => {
            tracing::debug!("response payload timed out, {} bytes declared", payload_len);
            Ok(BytesMut::new())
        }
        Fill::Eof(n) => {
            tracing::warn!(
                "peer closed after {} of {} declared payload bytes",
                n,
                payload_len
            );
            buf.truncate(RESPONSE_HEADER_SIZE + n);
            Ok(buf)
        }
        Fill::Complete => Ok(buf),
    }
}

/// Outcome of trying to fill a buffer completely.
enum Fill {
    Complete,
    /// Peer closed after this many bytes.
    Eof(usize),
    /// A read waited longer than the timeout.
    Silent,
}

async fn fill<R>(reader: &mut R, buf: &mut [u8], timeout: Duration) -> Result<Fill, ClientError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match tokio::time::timeout(timeout, reader.read(&mut buf[filled..])).await {
            Err(_) => return Ok(Fill::Silent),
            Ok(Ok(0)) => return Ok(Fill::Eof(filled)),
            Ok(Ok(n)) => filled += n,
            Ok(Err(e)) => return Err(ClientError::ReadFailure(e)),
        }
    }
    Ok(Fill::Complete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tokio_test::io::Builder;

    const TIMEOUT: Duration = Duration::from_millis(500);
    const NUMBER_RESPONSE: [u8; 9] = [0, 0x83, 0, 5, 0x2a, 0, 0, 0xb8, 0x41];

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            "until_timeout".parse::<ReadStrategy>().unwrap(),
            ReadStrategy::UntilTimeout
        );
        assert_eq!(
            "Declared-Length".parse::<ReadStrategy>().unwrap(),
            ReadStrategy::DeclaredLength
        );
        assert!("sniff".parse::<ReadStrategy>().is_err());
        assert!("timeout".parse::<ReadStrategy>().is_err());
        assert!("length".parse::<ReadStrategy>().is_err());
        assert_eq!(ReadStrategy::default(), ReadStrategy::DeclaredLength);
    }

    #[test]
    fn test_strategy_display_parses_back() {
        for strategy in [ReadStrategy::UntilTimeout, ReadStrategy::DeclaredLength] {
            assert_eq!(strategy.to_string().parse::<ReadStrategy>().unwrap(), strategy);
        }
    }

    #[tokio::test]
    async fn test_declared_length_reads_exact_frame() {
        let mut mock = Builder::new().read(&NUMBER_RESPONSE).build();
        let buf = ReadStrategy::DeclaredLength
            .read(&mut mock, TIMEOUT, 10_000)
            .await
            .unwrap();
        assert_eq!(&buf[..], &NUMBER_RESPONSE[..]);
    }

    #[tokio::test]
    async fn test_declared_length_across_fragments() {
        let mut mock = Builder::new()
            .read(&NUMBER_RESPONSE[..2])
            .read(&NUMBER_RESPONSE[2..6])
            .read(&NUMBER_RESPONSE[6..])
            .build();
        let buf = ReadStrategy::DeclaredLength
            .read(&mut mock, TIMEOUT, 10_000)
            .await
            .unwrap();
        assert_eq!(&buf[..], &NUMBER_RESPONSE[..]);
    }

    #[tokio::test]
    async fn test_declared_length_eof_without_data() {
        let mut mock = Builder::new().build();
        let buf = ReadStrategy::DeclaredLength
            .read(&mut mock, TIMEOUT, 10_000)
            .await
            .unwrap();
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn test_declared_length_zero_payload_is_empty() {
        let mut mock = Builder::new().read(&[0, 0x83, 0, 1, 6]).build();
        let buf = ReadStrategy::DeclaredLength
            .read(&mut mock, TIMEOUT, 10_000)
            .await
            .unwrap();
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn test_declared_length_short_payload_returns_partial() {
        // Declares 0x0304 bytes of payload, then the peer closes
        let mut mock = Builder::new().read(&[1, 2, 3, 4, 5]).build();
        let buf = ReadStrategy::DeclaredLength
            .read(&mut mock, TIMEOUT, 10_000)
            .await
            .unwrap();
        assert_eq!(&buf[..], &[1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_declared_length_partial_header() {
        let mut mock = Builder::new().read(&[0, 0x83]).build();
        let buf = ReadStrategy::DeclaredLength
            .read(&mut mock, TIMEOUT, 10_000)
            .await
            .unwrap();
        assert_eq!(&buf[..], &[0, 0x83]);
    }

    #[tokio::test]
    async fn test_declared_length_read_error() {
        let mut mock = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let result = ReadStrategy::DeclaredLength
            .read(&mut mock, TIMEOUT, 10_000)
            .await;
        assert!(matches!(result, Err(ClientError::ReadFailure(_))));
    }

    #[tokio::test]
    async fn test_until_timeout_reads_to_eof() {
        let mut mock = Builder::new()
            .read(&NUMBER_RESPONSE[..4])
            .read(&NUMBER_RESPONSE[4..])
            .build();
        let buf = ReadStrategy::UntilTimeout
            .read(&mut mock, TIMEOUT, 10_000)
            .await
            .unwrap();
        assert_eq!(&buf[..], &NUMBER_RESPONSE[..]);
    }

    #[tokio::test]
    async fn test_until_timeout_keeps_trailing_bytes() {
        let mut mock = Builder::new()
            .read(&NUMBER_RESPONSE)
            .read(&[0, 0, 0, 0])
            .build();
        let buf = ReadStrategy::UntilTimeout
            .read(&mut mock, TIMEOUT, 10_000)
            .await
            .unwrap();
        assert_eq!(buf.len(), NUMBER_RESPONSE.len() + 4);
    }

    #[tokio::test]
    async fn test_until_timeout_stops_at_capacity() {
        let data = vec![7u8; 64];
        let mut mock = Builder::new().read(&data[..16]).build();
        let buf = ReadStrategy::UntilTimeout
            .read(&mut mock, TIMEOUT, 16)
            .await
            .unwrap();
        assert_eq!(buf.len(), 16);
    }

    #[tokio::test]
    async fn test_until_timeout_huge_capacity_grows_on_demand() {
        let mut mock = Builder::new().read(&NUMBER_RESPONSE).build();
        let buf = ReadStrategy::UntilTimeout
            .read(&mut mock, TIMEOUT, usize::MAX)
            .await
            .unwrap();
        assert_eq!(&buf[..], &NUMBER_RESPONSE[..]);
    }

    #[tokio::test]
    async fn test_until_timeout_eof_without_data() {
        let mut mock = Builder::new().build();
        let buf = ReadStrategy::UntilTimeout
            .read(&mut mock, TIMEOUT, 10_000)
            .await
            .unwrap();
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn test_until_timeout_read_error() {
        let mut mock = Builder::new()
            .read(&NUMBER_RESPONSE[..3])
            .read_error(io::Error::new(io::ErrorKind::ConnectionAborted, "aborted"))
            .build();
        let result = ReadStrategy::UntilTimeout
            .read(&mut mock, TIMEOUT, 10_000)
            .await;
        assert!(matches!(result, Err(ClientError::ReadFailure(_))));
    }

    #[tokio::test]
    async fn test_both_strategies_treat_silence_as_empty() {
        // A peer that accepts but never writes
        let (mut client, _server) = tokio::io::duplex(64);
        let short = Duration::from_millis(50);

        let buf = ReadStrategy::UntilTimeout
            .read(&mut client, short, 10_000)
            .await
            .unwrap();
        assert!(buf.is_empty());

        let buf = ReadStrategy::DeclaredLength
            .read(&mut client, short, 10_000)
            .await
            .unwrap();
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn test_declared_length_payload_timeout_is_empty() {
        use tokio::io::AsyncWriteExt;

        let (mut client, mut server) = tokio::io::duplex(64);
        // Header promises 4 payload bytes, only 2 arrive
        server.write_all(&NUMBER_RESPONSE[..7]).await.unwrap();

        let buf = ReadStrategy::DeclaredLength
            .read(&mut client, Duration::from_millis(50), 10_000)
            .await
            .unwrap();
        assert!(buf.is_empty());
        drop(server);
    }
}
