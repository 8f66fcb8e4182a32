//! Prelude module for Wavesock Core
//!
//! Re-exports the types most users need so a single glob import is
//! enough.

pub use crate::error::{Error, FrameError, HandshakeError, Result};
pub use crate::frame::{Frame, FrameCodec};
pub use crate::handshake::{IncomingRequest, UpgradeRequest};
pub use crate::protocol::{Opcode, Role};
pub use crate::transport::{Transport, TransportStream};

// Re-export commonly used external dependencies
pub use bytes::{Bytes, BytesMut};
