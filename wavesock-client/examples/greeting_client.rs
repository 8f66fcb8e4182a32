//! Connect to a wavesock greeting server and print the message it
//! sends.
//!
//! Run the server first:
//!
//! ```sh
//! cargo run -p wavesock-server --example greeting_server
//! ```

use wavesock_client::{Client, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::new(ClientConfig::default())?;
    let message = client.fetch_text().await?;
    println!("Received from server: {message}");
    Ok(())
}
