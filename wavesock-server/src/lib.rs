//! Wavesock Server
//!
//! The handshake-responder side of Wavesock: validates inbound upgrade
//! requests, answers with 101 Switching Protocols, takes over the raw
//! stream, and sends a single text frame.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wavesock_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> wavesock_core::Result<()> {
//!     let server = Server::builder()
//!         .bind("0.0.0.0:8080")?
//!         .allowed_origin("http://localhost:8080")
//!         .greeting("Hello World")
//!         .build()?;
//!
//!     server.serve().await
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/wavesock-server/")]

// Public modules
pub mod config;
pub mod logging;
pub mod server;

// Prelude module with common imports
pub mod prelude;

// Re-export key types for convenience
pub use config::ServerConfig;
pub use logging::init_logging;
pub use server::{AcceptedRequest, Server, ServerBuilder};
