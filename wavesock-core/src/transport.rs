//! Transport layer abstraction
//!
//! Wavesock never opens listeners or resolves addresses itself; a
//! transport implementation hands the protocol code a connected,
//! readable/writable byte stream. `wavesock-transport-tcp` provides the
//! TCP implementation of these traits.

use crate::error::Result;

/// Transport trait for abstracting different transport types
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// The stream type produced by this transport
    type Stream: TransportStream;

    /// Accept an incoming connection
    async fn accept(&self) -> Result<Self::Stream>;

    /// Get the local address
    fn local_addr(&self) -> Result<std::net::SocketAddr>;
}

/// Trait for transport streams
///
/// A stream is an exclusively-owned per-connection resource; callers
/// close it on every exit path. `read` may return fewer bytes than the
/// buffer holds, so protocol code loops until it has what it needs.
#[async_trait::async_trait]
pub trait TransportStream: Send + Sync {
    /// Read data from the stream, returning the number of bytes read
    /// (0 means end of stream)
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all data to the stream
    async fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Flush the stream
    async fn flush(&mut self) -> Result<()>;

    /// Close the stream
    async fn close(&mut self) -> Result<()>;

    /// Get the remote address
    fn remote_addr(&self) -> Result<std::net::SocketAddr>;
}
