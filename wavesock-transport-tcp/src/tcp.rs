//! TCP transport implementation for Wavesock

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream as TokioTcpStream};
use wavesock_core::{
    transport::{Transport, TransportStream},
    Error, Result,
};

/// TCP transport implementation
#[derive(Debug)]
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpTransport {
    /// Create a new TCP transport bound to the given address
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(Error::Io)?;
        let local_addr = listener.local_addr().map_err(Error::Io)?;

        Ok(Self {
            listener,
            local_addr,
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type Stream = TcpStream;

    async fn accept(&self) -> Result<Self::Stream> {
        let (stream, _addr) = self.listener.accept().await.map_err(Error::Io)?;
        Ok(TcpStream::from_tokio(stream))
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.local_addr)
    }
}

/// TCP stream implementation
#[derive(Debug)]
pub struct TcpStream {
    stream: TokioTcpStream,
    remote_addr: SocketAddr,
}

impl TcpStream {
    /// Wrap an already-connected tokio TCP stream
    pub fn from_tokio(stream: TokioTcpStream) -> Self {
        let remote_addr = stream
            .peer_addr()
            .unwrap_or_else(|_| "0.0.0.0:0".parse().expect("static addr parses"));

        Self {
            stream,
            remote_addr,
        }
    }

    /// Connect to a remote address
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TokioTcpStream::connect(addr).await.map_err(Error::Io)?;
        Ok(Self::from_tokio(stream))
    }

    /// Connect to a `host:port` authority, resolving it first
    pub async fn connect_host(host: &str) -> Result<Self> {
        let stream = TokioTcpStream::connect(host).await.map_err(Error::Io)?;
        Ok(Self::from_tokio(stream))
    }
}

#[async_trait]
impl TransportStream for TcpStream {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        use tokio::io::AsyncReadExt;
        self.stream.read(buf).await.map_err(Error::Io)
    }

    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        use tokio::io::AsyncWriteExt;
        self.stream.write_all(buf).await.map_err(Error::Io)
    }

    async fn flush(&mut self) -> Result<()> {
        use tokio::io::AsyncWriteExt;
        self.stream.flush().await.map_err(Error::Io)
    }

    async fn close(&mut self) -> Result<()> {
        use tokio::io::AsyncWriteExt;
        self.stream.shutdown().await.map_err(Error::Io)
    }

    fn remote_addr(&self) -> Result<SocketAddr> {
        Ok(self.remote_addr)
    }
}
