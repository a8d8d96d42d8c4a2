//! Client calls against an in-process server with canned replies.

use byond_topic_client::{
    Client, ClientConfig, ClientError, OutboundMessage, ReadStrategy, ResponseKind,
    ServerAddress, WireResponse,
};
use byond_topic_protocol::ProtocolError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const NUMBER_RESPONSE: [u8; 9] = [0, 0x83, 0, 5, 0x2a, 0, 0, 0xb8, 0x41];

const TEXT_RESPONSE: [u8; 22] = [
    0, 0x83, 0, 18, 6, 83, 112, 97, 99, 101, 32, 83, 116, 97, 116, 105, 111, 110, 32, 49, 51, 0,
];

const UNKNOWN_RESPONSE: [u8; 5] = [1, 2, 3, 4, 5];

struct CannedServer {
    address: ServerAddress,
    closed: Arc<AtomicUsize>,
}

impl CannedServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let closed = Arc::new(AtomicUsize::new(0));

        let counter = closed.clone();
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                let counter = counter.clone();
                tokio::spawn(async move {
                    handle(socket).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        Self {
            address: ServerAddress::new("127.0.0.1", port),
            closed,
        }
    }

    fn message(&self, topic: &str) -> OutboundMessage {
        OutboundMessage::new(self.address.clone(), topic)
    }

    /// Waits until `n` connections have been closed by the client.
    async fn wait_closed(&self, n: usize) {
        for _ in 0..100 {
            if self.closed.load(Ordering::SeqCst) >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("client did not close its connections");
    }
}

async fn read_topic(socket: &mut TcpStream) -> Option<String> {
    let mut header = [0u8; 9];
    socket.read_exact(&mut header).await.ok()?;
    let mut topic = Vec::new();
    loop {
        let byte = socket.read_u8().await.ok()?;
        if byte == 0 {
            break;
        }
        topic.push(byte);
    }
    String::from_utf8(topic).ok()
}

async fn handle(mut socket: TcpStream) {
    let Some(topic) = read_topic(&mut socket).await else {
        return;
    };

    let reply: &[u8] = match topic.as_str() {
        "?number" => &NUMBER_RESPONSE,
        "?text" => &TEXT_RESPONSE,
        "?unknown" => &UNKNOWN_RESPONSE,
        "?silent" => {
            // Hold the connection open until the client gives up
            let mut rest = Vec::new();
            let _ = socket.read_to_end(&mut rest).await;
            return;
        }
        _ => return,
    };

    if socket.write_all(reply).await.is_err() {
        return;
    }
    // Wait for the client to hang up
    let mut rest = Vec::new();
    let _ = socket.read_to_end(&mut rest).await;
}

fn client_with(strategy: ReadStrategy) -> Client {
    Client::new(ClientConfig {
        read_timeout_ms: 200,
        read_strategy: strategy,
        ..ClientConfig::default()
    })
}

#[tokio::test]
async fn test_number_reply() {
    let server = CannedServer::start().await;
    let client = client_with(ReadStrategy::DeclaredLength);

    let reply = client.send_message(&server.message("number")).await.unwrap();
    assert_eq!(reply, WireResponse::Float(23.0));

    server.wait_closed(1).await;
}

#[tokio::test]
async fn test_text_reply_both_strategies() {
    let server = CannedServer::start().await;

    for strategy in [ReadStrategy::DeclaredLength, ReadStrategy::UntilTimeout] {
        let client = client_with(strategy);
        let message = server.message("?text").with_expected(ResponseKind::String);
        let reply = client.send_message(&message).await.unwrap();
        assert_eq!(reply.as_str(), Some("Space Station 13"));
    }

    server.wait_closed(2).await;
}

#[tokio::test]
async fn test_unexpected_type() {
    let server = CannedServer::start().await;
    let client = client_with(ReadStrategy::DeclaredLength);

    let message = server.message("number").with_expected(ResponseKind::String);
    let result = client.send_message(&message).await;
    assert!(matches!(
        result,
        Err(ClientError::UnexpectedResponseType {
            expected: ResponseKind::String,
            actual: ResponseKind::Float,
        })
    ));

    server.wait_closed(1).await;
}

#[tokio::test]
async fn test_unknown_encoding() {
    let server = CannedServer::start().await;
    let client = client_with(ReadStrategy::UntilTimeout);

    let result = client.send_message(&server.message("unknown")).await;
    assert!(matches!(
        result,
        Err(ClientError::Protocol(ProtocolError::UnknownResponseEncoding(5)))
    ));

    // The garbage header declares 771 payload bytes that never arrive
    let client = client_with(ReadStrategy::DeclaredLength);
    let err = client.send_message(&server.message("unknown")).await.unwrap_err();
    assert!(err.is_empty_response());
}

#[tokio::test]
async fn test_no_reply_is_empty_response() {
    let server = CannedServer::start().await;

    for strategy in [ReadStrategy::DeclaredLength, ReadStrategy::UntilTimeout] {
        let client = client_with(strategy);
        let err = client.send_message(&server.message("test")).await.unwrap_err();
        assert!(err.is_empty_response(), "{strategy}: {err}");
    }
}

#[tokio::test]
async fn test_silent_server_is_empty_response() {
    let server = CannedServer::start().await;

    for strategy in [ReadStrategy::DeclaredLength, ReadStrategy::UntilTimeout] {
        let client = client_with(strategy);
        let err = client
            .send_message(&server.message("silent"))
            .await
            .unwrap_err();
        assert!(err.is_empty_response(), "{strategy}: {err}");
    }

    server.wait_closed(2).await;
}

#[tokio::test]
async fn test_send_message_with_timeout() {
    let server = CannedServer::start().await;
    let client = client_with(ReadStrategy::DeclaredLength);

    let reply = client
        .send_message_with_timeout(&server.message("number"), Duration::from_millis(100))
        .await
        .unwrap();
    assert_eq!(reply.as_float(), Some(23.0));

    // Zero falls back to the configured behavior
    let reply = client
        .send_message_with_timeout(&server.message("text"), Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(reply.as_str(), Some("Space Station 13"));
}

#[tokio::test]
async fn test_send_command_does_not_read() {
    let server = CannedServer::start().await;
    let client = client_with(ReadStrategy::DeclaredLength);

    // The server would answer, but nothing is read and nothing is decoded
    client.send_command(server.message("unknown")).await.unwrap();
    server.wait_closed(1).await;
}

#[tokio::test]
async fn test_expect_none_returns_none() {
    let server = CannedServer::start().await;
    let client = client_with(ReadStrategy::DeclaredLength);

    let message = server.message("number").with_expected(ResponseKind::None);
    let reply = client.send_message(&message).await.unwrap();
    assert!(reply.is_none());
}

#[tokio::test]
async fn test_host_unavailable() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = client_with(ReadStrategy::DeclaredLength);

    let message = OutboundMessage::new(ServerAddress::new("127.0.0.1", port), "number");
    let err = client.send_message(&message).await.unwrap_err();
    assert!(matches!(err, ClientError::HostUnavailable(_)));
    assert!(err.is_connect_error());
}
