//! WebSocket server implementation
//!
//! The accept loop hands each connection to its own task; a single
//! connection's handshake-then-frame sequence is strictly sequential,
//! and one connection's failure never touches another. Validation
//! failures produce an HTTP rejection and no frame traffic; after the
//! upgrade the server sends exactly one text frame and closes.

use crate::config::ServerConfig;
use std::sync::Arc;
use tokio::time::timeout;
use wavesock_core::frame::FrameCodec;
use wavesock_core::handshake::{self, IncomingRequest};
use wavesock_core::protocol::{http_status, Role};
use wavesock_core::transport::{Transport, TransportStream};
use wavesock_core::{Error, HandshakeError, Result};
use wavesock_transport_tcp::TcpTransport;

const MAX_REQUEST_HEADERS: usize = 32;

/// WebSocket server (handshake responder)
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Create a server with a validated configuration
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a server builder
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Bind the configured address and serve until interrupted
    pub async fn serve(self) -> Result<()> {
        let transport = TcpTransport::bind(self.config.bind_address).await?;
        self.serve_with(transport).await
    }

    /// Serve connections from an already-bound transport
    pub async fn serve_with<T>(self, transport: T) -> Result<()>
    where
        T: Transport,
        T::Stream: 'static,
    {
        crate::log_info!("listening on {}", transport.local_addr()?);
        let config = Arc::new(self.config);

        loop {
            tokio::select! {
                result = transport.accept() => match result {
                    Ok(stream) => {
                        let peer = stream
                            .remote_addr()
                            .map(|addr| addr.to_string())
                            .unwrap_or_else(|_| "<unknown>".to_string());
                        crate::log_debug!("accepted connection from {}", peer);

                        let config = Arc::clone(&config);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &config).await {
                                crate::log_warn!("connection from {} failed: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => {
                        crate::log_error!("accept error: {}", e);
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    crate::log_info!("shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Drive one connection from raw bytes to its final state.
///
/// The stream is closed on every exit path: rejection, I/O failure, or
/// a successfully delivered greeting.
async fn handle_connection<S>(mut stream: S, config: &ServerConfig) -> Result<()>
where
    S: TransportStream,
{
    let head = match timeout(
        config.handshake_timeout,
        handshake::read_header_block(&mut stream, config.max_header_size),
    )
    .await
    {
        Ok(Ok((head, _leftover))) => head,
        Ok(Err(e)) => {
            let _ = stream.close().await;
            return Err(e);
        }
        Err(_) => {
            let _ = stream.close().await;
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "handshake timed out",
            )));
        }
    };

    let request = match parse_request(&head) {
        Ok(request) => request,
        Err(e) => {
            let response = handshake::rejection_response(
                http_status::BAD_REQUEST,
                "Not a valid WebSocket handshake",
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.flush().await;
            let _ = stream.close().await;
            return Err(e);
        }
    };

    respond(AcceptedRequest::new(request, stream), config).await
}

/// Validate the request, emit the upgrade or rejection, and send the
/// greeting frame over the taken-over stream.
async fn respond<S>(mut accepted: AcceptedRequest<S>, config: &ServerConfig) -> Result<()>
where
    S: TransportStream,
{
    let key = match handshake::validate_upgrade(accepted.request(), &config.allowed_origin) {
        Ok(key) => key.to_owned(),
        Err(err) => {
            if let Some((status, body)) = err.rejection() {
                let response = handshake::rejection_response(status, body);
                let _ = accepted.write_response(&response).await;
            }
            accepted.shutdown().await;
            crate::log_warn!("upgrade rejected: {}", err);
            return Err(err.into());
        }
    };

    let accept_key = handshake::compute_accept_key(&key);
    if let Err(e) = accepted
        .write_response(&handshake::accept_response(&accept_key))
        .await
    {
        accepted.shutdown().await;
        return Err(e);
    }

    let mut stream = accepted.hijack().await?;

    let codec = FrameCodec::new(Role::Responder);
    let sent = match timeout(config.io_timeout, codec.write_text(&mut stream, &config.greeting))
        .await
    {
        Ok(result) => result,
        Err(_) => Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "frame write timed out",
        ))),
    };
    let _ = stream.close().await;

    if sent.is_ok() {
        crate::log_info!("sent greeting ({} bytes)", config.greeting.len());
    }
    sent
}

/// Parse the raw header block into the core's request view
fn parse_request(head: &[u8]) -> Result<IncomingRequest> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_REQUEST_HEADERS];
    let mut parsed = httparse::Request::new(&mut headers);

    match parsed.parse(head) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => return Err(HandshakeError::Incomplete.into()),
        Err(_) => return Err(HandshakeError::NotWebSocketUpgrade.into()),
    }

    let mut request =
        IncomingRequest::new(parsed.method.unwrap_or("GET"), parsed.path.unwrap_or("/"));
    for header in parsed.headers.iter() {
        request.insert_header(header.name, String::from_utf8_lossy(header.value).to_string());
    }

    Ok(request)
}

/// An inbound request still attached to the raw stream it arrived on
///
/// HTTP responses go through [`AcceptedRequest::write_response`]; frame
/// traffic requires taking the stream back out with
/// [`AcceptedRequest::hijack`].
pub struct AcceptedRequest<S: TransportStream> {
    request: IncomingRequest,
    stream: S,
    hijack_supported: bool,
}

impl<S: TransportStream> std::fmt::Debug for AcceptedRequest<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceptedRequest")
            .field("request", &self.request)
            .field("hijack_supported", &self.hijack_supported)
            .field("stream", &"<stream>")
            .finish()
    }
}

impl<S: TransportStream> AcceptedRequest<S> {
    /// Wrap a parsed request and the stream it was read from
    pub fn new(request: IncomingRequest, stream: S) -> Self {
        Self {
            request,
            stream,
            hijack_supported: true,
        }
    }

    /// Mark the carrier as unable to yield its raw stream.
    ///
    /// Transports that buffer or multiplex the connection cannot hand
    /// over the socket; upgrades on them fail after the response
    /// headers with [`Error::HijackUnsupported`].
    pub fn without_hijack(mut self) -> Self {
        self.hijack_supported = false;
        self
    }

    /// The parsed request under consideration
    pub fn request(&self) -> &IncomingRequest {
        &self.request
    }

    /// Write a raw HTTP response to the underlying stream
    pub async fn write_response(&mut self, raw: &str) -> Result<()> {
        self.stream.write_all(raw.as_bytes()).await?;
        self.stream.flush().await
    }

    /// Release the underlying stream without taking it over
    pub async fn shutdown(&mut self) {
        let _ = self.stream.close().await;
    }

    /// Take raw read/write control of the underlying stream.
    ///
    /// When the transport cannot be taken over, a 500 response is
    /// written, the stream is released, and the upgrade fails.
    pub async fn hijack(mut self) -> Result<S> {
        if self.hijack_supported {
            Ok(self.stream)
        } else {
            let response = handshake::rejection_response(
                http_status::INTERNAL_SERVER_ERROR,
                "Hijacking not supported",
            );
            let _ = self.write_response(&response).await;
            self.shutdown().await;
            Err(Error::HijackUnsupported)
        }
    }
}

/// Server builder
#[derive(Debug, Clone, Default)]
pub struct ServerBuilder {
    config: ServerConfig,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Bind to the given address
    pub fn bind<A: std::net::ToSocketAddrs>(mut self, addr: A) -> Result<Self> {
        self.config.bind_address = addr.to_socket_addrs()?.next().ok_or_else(|| {
            Error::Config(wavesock_core::error::ConfigError::Validation(
                "invalid bind address".to_string(),
            ))
        })?;
        Ok(self)
    }

    /// Set the exact Origin header value upgrades must present
    pub fn allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.allowed_origin = origin.into();
        self
    }

    /// Set the greeting sent after a successful upgrade
    pub fn greeting(mut self, greeting: impl Into<String>) -> Self {
        self.config.greeting = greeting.into();
        self
    }

    /// Set the handshake timeout
    pub fn handshake_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Set the post-upgrade I/O timeout
    pub fn io_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.io_timeout = timeout;
        self
    }

    /// Set the maximum inbound header block size
    pub fn max_header_size(mut self, size: usize) -> Self {
        self.config.max_header_size = size;
        self
    }

    /// Build the server
    pub fn build(self) -> Result<Server> {
        Server::new(self.config)
    }
}
