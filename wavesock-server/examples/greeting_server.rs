//! Serve the single-frame greeting on port 8080.
//!
//! Pair with the client example:
//!
//! ```sh
//! cargo run -p wavesock-client --example greeting_client
//! ```

use wavesock_server::{init_logging, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    let server = Server::builder()
        .bind("0.0.0.0:8080")?
        .allowed_origin("http://localhost:8080")
        .greeting("Hello World")
        .build()?;

    println!("WebSocket server started on :8080");
    server.serve().await?;
    Ok(())
}
