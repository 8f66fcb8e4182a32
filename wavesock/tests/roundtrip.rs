//! End-to-end round trips through the public client and server APIs

use wavesock::client::{Client, ClientConfig, ConnectionState};
use wavesock::server::{Server, ServerConfig};
use wavesock::transport_tcp::TcpTransport;
use wavesock::{Error, HandshakeError, Transport};

const ORIGIN: &str = "http://localhost:8080";

async fn spawn_server(greeting: &str) -> std::net::SocketAddr {
    let transport = TcpTransport::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let addr = transport.local_addr().unwrap();

    let mut config = ServerConfig::default();
    config.allowed_origin = ORIGIN.to_string();
    config.greeting = greeting.to_string();

    let server = Server::new(config).unwrap();
    tokio::spawn(server.serve_with(transport));
    addr
}

fn client_for(addr: std::net::SocketAddr, origin: &str) -> Client {
    let config = ClientConfig::default()
        .host(addr.to_string())
        .path("/ws")
        .origin(origin);
    Client::new(config).unwrap()
}

#[tokio::test]
async fn client_receives_server_greeting() {
    let addr = spawn_server("Hello World").await;
    let client = client_for(addr, ORIGIN);

    let message = client.fetch_text().await.unwrap();
    assert_eq!(message, "Hello World");
}

#[tokio::test]
async fn explicit_connect_and_recv() {
    let addr = spawn_server("one small frame").await;
    let client = client_for(addr, ORIGIN);

    let mut connection = client.connect().await.unwrap();
    assert_eq!(connection.state(), ConnectionState::Streaming);
    assert_eq!(connection.recv_text().await.unwrap(), "one small frame");

    // the server hangs up after its single frame; the next read fails
    // and the connection ends up closed
    assert!(connection.recv_text().await.is_err());
    assert_eq!(connection.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn mismatched_origin_is_rejected_end_to_end() {
    let addr = spawn_server("Hello World").await;
    let client = client_for(addr, "http://unexpected.example");

    match client.fetch_text().await {
        Err(Error::Handshake(HandshakeError::Rejected { status_line })) => {
            assert!(status_line.contains("403"));
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_greeting_round_trips() {
    let addr = spawn_server("").await;
    let client = client_for(addr, ORIGIN);
    assert_eq!(client.fetch_text().await.unwrap(), "");
}

#[tokio::test]
async fn boundary_greeting_round_trips() {
    let greeting = "x".repeat(125);
    let addr = spawn_server(&greeting).await;
    let client = client_for(addr, ORIGIN);
    assert_eq!(client.fetch_text().await.unwrap(), greeting);
}
