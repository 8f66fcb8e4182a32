//! Error types for Wavesock
//!
//! Every error here is fatal to the connection it occurred on: there is
//! no retry or resume of a partial handshake or partial frame, and one
//! connection's failure never affects another.

use crate::protocol::http_status;
use thiserror::Error;

/// Result type alias for Wavesock operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for Wavesock operations
#[derive(Error, Debug)]
pub enum Error {
    /// Stream open/read/write failure
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// Handshake errors
    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    /// Frame codec errors
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The transport cannot yield its raw stream after the upgrade
    /// response has been written (responder only)
    #[error("transport does not support connection takeover")]
    HijackUnsupported,
}

/// Errors raised while negotiating the upgrade handshake
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// The peer answered with something other than 101 Switching
    /// Protocols (initiator side)
    #[error("upgrade rejected by peer: {status_line:?}")]
    Rejected {
        /// The status line the peer actually sent
        status_line: String,
    },

    /// The stream ended before the blank line terminating the header
    /// block was seen
    #[error("stream ended before end of handshake headers")]
    Incomplete,

    /// The header block exceeded the allowed size before terminating
    #[error("handshake header block exceeds {limit} bytes")]
    HeadersTooLarge {
        /// The configured size cap
        limit: usize,
    },

    /// The request's Origin header did not exactly match the allowed
    /// origin (responder side)
    #[error("origin not allowed: {origin:?}")]
    OriginNotAllowed {
        /// The Origin header value presented, if any
        origin: Option<String>,
    },

    /// The Upgrade header was missing or not the literal `websocket`
    /// (responder side)
    #[error("not a valid websocket upgrade request")]
    NotWebSocketUpgrade,

    /// The Sec-WebSocket-Key header was missing or empty (responder
    /// side)
    #[error("missing Sec-WebSocket-Key header")]
    MissingKey,
}

impl HandshakeError {
    /// The HTTP status and body a responder writes back for this
    /// error, if the error calls for a structured rejection. Initiator
    /// side errors and torn streams return `None`: there is nothing
    /// useful to write.
    pub fn rejection(&self) -> Option<(u16, &'static str)> {
        match self {
            HandshakeError::OriginNotAllowed { .. } => {
                Some((http_status::FORBIDDEN, "Origin not allowed"))
            }
            HandshakeError::NotWebSocketUpgrade => {
                Some((http_status::BAD_REQUEST, "Not a valid WebSocket handshake"))
            }
            HandshakeError::MissingKey => {
                Some((http_status::BAD_REQUEST, "Missing Sec-WebSocket-Key"))
            }
            _ => None,
        }
    }
}

/// Frame parsing and encoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Not enough buffered bytes to finish parsing the frame
    #[error("insufficient data: need {needed} bytes, have {have}")]
    InsufficientData {
        /// Bytes required for a complete frame
        needed: usize,
        /// Bytes currently buffered
        have: usize,
    },

    /// The FIN bit was clear; continuation frames are not handled
    #[error("continuation frames are not supported")]
    UnsupportedFragmentation,

    /// The opcode was not the text tag
    #[error("unsupported frame type: opcode {0:#03x}")]
    UnsupportedFrameType(u8),

    /// The length field held an extended-length marker (126 or 127)
    #[error("extended payload length marker {0} is not supported")]
    UnsupportedExtendedLength(u8),

    /// The mask bit contradicts what the role policy expects
    #[error("frame masking contradicts role policy (masked: {masked}, expected: {expected})")]
    MaskingPolicyViolation {
        /// The mask bit as observed on the wire
        masked: bool,
        /// What the receiving role requires
        expected: bool,
    },

    /// The payload does not fit a single small frame
    #[error("payload too large: {len} bytes (max {max})")]
    PayloadTooLarge {
        /// Byte length of the offered payload
        len: usize,
        /// Largest encodable payload
        max: usize,
    },

    /// Text frame payload was not valid UTF-8
    #[error("invalid UTF-8 in text frame")]
    InvalidUtf8,
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("configuration validation failed: {0}")]
    Validation(String),
}
