//! # Wavesock
//!
//! Minimal WebSocket library: an HTTP upgrade handshake over TCP and a
//! codec for single, unfragmented text frames, in both the client and
//! server roles.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wavesock::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> wavesock::Result<()> {
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
#![doc(html_root_url = "https://docs.rs/wavesock/")]

// Re-export core components
pub use wavesock_core::*;

pub use wavesock_client as client;
pub use wavesock_server as server;
pub use wavesock_transport_tcp as transport_tcp;

/// Prelude module with common imports
pub mod prelude {
    pub use wavesock_client::prelude::*;
    pub use wavesock_core::prelude::*;
    pub use wavesock_server::prelude::*;
    pub use wavesock_transport_tcp::prelude::*;
}

#[cfg(test)]
mod tests {
    #[test]
    fn library_compiles() {
        assert_eq!(env!("CARGO_PKG_NAME"), "wavesock");
    }
}
