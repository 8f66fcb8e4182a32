//! Wavesock Client
//!
//! The handshake-initiator side of Wavesock: builds the HTTP upgrade
//! request, validates the switching-protocols response, and exchanges
//! single text frames on the upgraded stream.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wavesock_client::{Client, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> wavesock_core::Result<()> {
//!     let client = Client::new(ClientConfig::default())?;
//!     let message = client.fetch_text().await?;
//!     println!("{message}");
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/wavesock-client/")]

// Public modules
pub mod client;
pub mod config;

// Prelude module with common imports
pub mod prelude;

// Re-export key types for convenience
pub use client::{Client, Connection, ConnectionState};
pub use config::ClientConfig;
