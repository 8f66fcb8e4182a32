//! WebSocket upgrade handshake
//!
//! Key generation and accept-key derivation, the initiator's request
//! builder, and the responder's request validation. Serialization
//! produces the exact CRLF-terminated wire format; validation is
//! deliberately strict and short-circuits on the first failure.

use crate::error::{HandshakeError, Result};
use crate::protocol::constants::{WEBSOCKET_KEY_LEN, WEBSOCKET_MAGIC, WEBSOCKET_VERSION};
use crate::protocol::{http_header, http_status, http_value};
use crate::transport::TransportStream;
use base64::{engine::general_purpose, Engine as _};
use bytes::BytesMut;
use sha1::{Digest, Sha1};
use std::collections::HashMap;

/// Generate a fresh random WebSocket key
///
/// 16 bytes from a cryptographically secure source, base64-encoded.
/// The key must be fresh per connection attempt; it exists so the
/// responder can prove it handled this specific request.
pub fn generate_key() -> String {
    use rand::RngCore;
    let mut key_bytes = [0u8; WEBSOCKET_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut key_bytes);
    general_purpose::STANDARD.encode(key_bytes)
}

/// Compute the accept key the responder echoes back for a client key
pub fn compute_accept_key(client_key: &str) -> String {
    let combined = format!("{}{}", client_key, WEBSOCKET_MAGIC);
    let hash = Sha1::digest(combined.as_bytes());
    general_purpose::STANDARD.encode(hash)
}

/// Upgrade request built by the handshake initiator
///
/// Immutable once constructed; a fresh key is generated at
/// construction and consumed by serialization.
#[derive(Debug, Clone)]
pub struct UpgradeRequest {
    host: String,
    path: String,
    origin: String,
    key: String,
}

impl UpgradeRequest {
    /// Build a request for `path` on `host` with a fresh random key
    pub fn new(host: impl Into<String>, path: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            origin: origin.into(),
            key: generate_key(),
        }
    }

    /// The key sent in the Sec-WebSocket-Key header
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Serialize the request into its wire form
    pub fn to_http(&self) -> String {
        format!(
            "GET {path} HTTP/1.1\r\n\
             Host: {host}\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Key: {key}\r\n\
             Sec-WebSocket-Version: {version}\r\n\
             Origin: {origin}\r\n\
             \r\n",
            path = self.path,
            host = self.host,
            key = self.key,
            version = WEBSOCKET_VERSION,
            origin = self.origin,
        )
    }
}

/// An inbound upgrade request as delivered by the server's HTTP layer
///
/// The core does not parse raw HTTP on the responder side; the caller
/// supplies the method, path, and headers it already parsed. Header
/// names are looked up case-insensitively, header values are matched
/// exactly.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    /// HTTP method
    pub method: String,
    /// Request path
    pub path: String,
    headers: HashMap<String, String>,
}

impl IncomingRequest {
    /// Create an empty request with the given method and path
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
        }
    }

    /// Record a header
    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_lowercase(), value.into());
    }

    /// Look up a header by (case-insensitive) name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Validate an inbound upgrade request against the configured origin.
///
/// Checks short-circuit in order: origin, upgrade header, key
/// presence. Returns the client's key on success so the caller can
/// derive the accept value without a second lookup.
pub fn validate_upgrade<'a>(
    request: &'a IncomingRequest,
    allowed_origin: &str,
) -> std::result::Result<&'a str, HandshakeError> {
    let origin = request.header(http_header::ORIGIN);
    if origin != Some(allowed_origin) {
        return Err(HandshakeError::OriginNotAllowed {
            origin: origin.map(str::to_owned),
        });
    }

    if request.header(http_header::UPGRADE) != Some(http_value::WEBSOCKET) {
        return Err(HandshakeError::NotWebSocketUpgrade);
    }

    match request.header(http_header::SEC_WEBSOCKET_KEY) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(HandshakeError::MissingKey),
    }
}

/// The 101 Switching Protocols response for a validated request
pub fn accept_response(accept_key: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept_key}\r\n\
         \r\n",
    )
}

/// An HTTP rejection response with a plain-text body
///
/// The body is terminated with a newline, matching the convention of
/// plain-text HTTP error bodies.
pub fn rejection_response(status: u16, body: &str) -> String {
    let reason = match status {
        http_status::BAD_REQUEST => "Bad Request",
        http_status::FORBIDDEN => "Forbidden",
        http_status::INTERNAL_SERVER_ERROR => "Internal Server Error",
        _ => "Error",
    };
    format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         Content-Length: {len}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}\n",
        len = body.len() + 1,
    )
}

/// Check an initiator-side response status line for 101
pub fn validate_status_line(line: &str) -> std::result::Result<(), HandshakeError> {
    let mut parts = line.split_whitespace();
    let _version = parts.next();
    match parts.next() {
        Some(code) if code == http_status::SWITCHING_PROTOCOLS.to_string() => Ok(()),
        _ => Err(HandshakeError::Rejected {
            status_line: line.trim_end().to_string(),
        }),
    }
}

/// Read from `stream` until the blank line terminating an HTTP header
/// block.
///
/// Returns the header block (terminator included) and any bytes that
/// arrived after it, which on the initiator side may already be the
/// start of a frame. Loops over short reads; end-of-stream before the
/// terminator is [`HandshakeError::Incomplete`], and a block that
/// outgrows `limit` is rejected outright.
pub async fn read_header_block<S>(stream: &mut S, limit: usize) -> Result<(BytesMut, BytesMut)>
where
    S: TransportStream + ?Sized,
{
    let mut buffer = BytesMut::new();
    let mut chunk = [0u8; 1024];

    loop {
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            let rest = buffer.split_off(pos + 4);
            return Ok((buffer, rest));
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
