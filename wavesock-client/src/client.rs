//! WebSocket client implementation
//!
//! `Client::connect` runs the upgrade handshake and hands back a
//! [`Connection`]; a connection value only ever exists for a stream
//! whose handshake already succeeded, so frame traffic before the
//! upgrade is unrepresentable.

use crate::config::ClientConfig;
use bytes::BytesMut;
use std::time::Duration;
use tokio::time::timeout;
use wavesock_core::frame::FrameCodec;
use wavesock_core::handshake::{self, UpgradeRequest};
use wavesock_core::protocol::constants::MAX_HEADER_SIZE;
use wavesock_core::protocol::Role;
use wavesock_core::transport::TransportStream;
use wavesock_core::{Error, HandshakeError, Result};
use wavesock_transport_tcp::TcpStream;

/// WebSocket client (handshake initiator)
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    /// Create a client with a validated configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The client's configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open a stream to the configured host, perform the upgrade
    /// handshake, and return the connection ready for frame exchange.
    ///
    /// The stream is closed on every handshake failure path.
    pub async fn connect(&self) -> Result<Connection> {
        let mut stream = TcpStream::connect_host(&self.config.host).await?;

        let outcome = match timeout(
            self.config.handshake_timeout,
            perform_handshake(&mut stream, &self.config),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(deadline_error("handshake timed out")),
        };

        match outcome {
            Ok(leftover) => Ok(Connection::new(
                Box::new(stream),
                leftover,
                self.config.io_timeout,
            )),
            Err(e) => {
                let _ = stream.close().await;
                Err(e)
            }
        }
    }

    /// Connect, receive a single text frame, and close.
    ///
    /// This is the whole exchange the protocol subset describes: one
    /// handshake followed by one responder-sent message.
    pub async fn fetch_text(&self) -> Result<String> {
        let mut connection = self.connect().await?;
        let result = connection.recv_text().await;
        let _ = connection.close().await;
        result
    }
}

/// Write the upgrade request and validate the response status line.
///
/// Header lines after the status line are read and discarded up to the
/// blank-line terminator; whatever bytes follow the terminator are
/// returned so they can seed the frame buffer.
async fn perform_handshake<S>(stream: &mut S, config: &ClientConfig) -> Result<BytesMut>
where
    S: TransportStream,
{
    let request = UpgradeRequest::new(
        config.host.clone(),
        config.path.clone(),
        config.origin.clone(),
    );
    stream.write_all(request.to_http().as_bytes()).await?;
    stream.flush().await?;

    read_upgrade_response(stream, MAX_HEADER_SIZE).await
}

/// Read the responder's header block, judging the status line as soon
/// as it is complete and only then discarding the remaining header
/// lines up to the terminator.
async fn read_upgrade_response<S>(stream: &mut S, limit: usize) -> Result<BytesMut>
where
    S: TransportStream,
{
    let mut buffer = BytesMut::new();
    let mut chunk = [0u8; 1024];
    let mut status_checked = false;

    loop {
        if !status_checked {
            if let Some(pos) = buffer.windows(2).position(|w| w == b"\r\n") {
                let line = String::from_utf8_lossy(&buffer[..pos]).to_string();
                handshake::validate_status_line(&line)?;
                status_checked = true;
            }
        }

        if status_checked {
            if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
                return Ok(buffer.split_off(pos + 4));
            }
        }

        if buffer.len() > limit {
            return Err(HandshakeError::HeadersTooLarge { limit }.into());
        }

        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(HandshakeError::Incomplete.into());
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
}

fn deadline_error(message: &str) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        message.to_string(),
    ))
}

/// Connection state after the upgrade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake done, frames may flow
    Streaming,
    /// Stream released; no further traffic
    Closed,
}

/// An upgraded client connection
///
/// Frames received here must be unmasked (they come from the
/// responder) and frames sent here are always masked, per the role
/// masking rule.
pub struct Connection {
    stream: Box<dyn TransportStream>,
    read_buf: BytesMut,
    codec: FrameCodec,
    state: ConnectionState,
    io_timeout: Duration,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state)
            .field("buffered", &self.read_buf.len())
            .field("stream", &"<stream>")
            .finish()
    }
}

impl Connection {
    pub(crate) fn new(
        stream: Box<dyn TransportStream>,
        leftover: BytesMut,
        io_timeout: Duration,
    ) -> Self {
        Self {
            stream,
            read_buf: leftover,
            codec: FrameCodec::new(Role::Initiator),
            state: ConnectionState::Streaming,
            io_timeout,
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Receive one text frame.
    ///
    /// Any decode or transport error is fatal: the stream is closed and
    /// the connection transitions to [`ConnectionState::Closed`].
    pub async fn recv_text(&mut self) -> Result<String> {
        self.ensure_streaming()?;

        let codec = self.codec;
        let read = match timeout(
            self.io_timeout,
            codec.read_text(self.stream.as_mut(), &mut self.read_buf),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(deadline_error("frame read timed out")),
        };

        match read {
            Ok(text) => Ok(text),
            Err(e) => {
                self.abort().await;
                Err(e)
            }
        }
    }

    /// Send one masked text frame
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.ensure_streaming()?;

        let codec = self.codec;
        let write = match timeout(
            self.io_timeout,
            codec.write_text(self.stream.as_mut(), text),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(deadline_error("frame write timed out")),
        };

        match write {
            Ok(()) => Ok(()),
            Err(e) => {
                self.abort().await;
                Err(e)
            }
        }
    }

    /// Close the connection, releasing the stream
    pub async fn close(&mut self) -> Result<()> {
        if self.state != ConnectionState::Closed {
            self.state = ConnectionState::Closed;
            self.stream.close().await?;
        }
        Ok(())
    }

    fn ensure_streaming(&self) -> Result<()> {
        if self.state == ConnectionState::Streaming {
            Ok(())
        } else {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "connection is closed",
            )))
        }
    }

    async fn abort(&mut self) {
        self.state = ConnectionState::Closed;
        let _ = self.stream.close().await;
    }
}
