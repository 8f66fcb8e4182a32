//! Prelude module with common imports

pub use crate::client::{Client, Connection, ConnectionState};
pub use crate::config::ClientConfig;

// Re-export core types
pub use wavesock_core::prelude::*;
