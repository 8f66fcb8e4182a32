//! # Wavesock Core
//!
//! Core protocol implementation for Wavesock, a minimal WebSocket
//! library covering the upgrade handshake and single-frame text
//! messaging. It includes:
//!
//! - Error handling and types
//! - Text frame encoding and parsing with the role masking rule
//! - Handshake key derivation, request building, and validation
//! - Protocol constants
//! - Transport layer abstractions

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/wavesock-core/")]

// Core modules
pub mod error;
pub mod frame;
pub mod handshake;
pub mod protocol;
pub mod transport;

// Prelude module with common imports
pub mod prelude;

// Re-export key types for convenience
pub use error::{Error, FrameError, HandshakeError, Result};
pub use frame::{Frame, FrameCodec};
pub use handshake::{IncomingRequest, UpgradeRequest};
pub use protocol::{Opcode, Role};
pub use transport::{Transport, TransportStream};
