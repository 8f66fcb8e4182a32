//! Prelude module with common imports

pub use crate::config::ServerConfig;
pub use crate::logging::init_logging;
pub use crate::server::{AcceptedRequest, Server, ServerBuilder};

// Re-export core types
pub use wavesock_core::prelude::*;
