//! Connects to a full node and prints the balance of one puzzle hash.
use std::sync::Arc;

use leaflet_client::{ClientConfig, Provider, WebSocketChannel};
use native_tls::TlsConnector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ClientConfig::new("node.example.com", "my-api-key");
    let tls_connector = TlsConnector::builder().danger_accept_invalid_certs(true).build()?;
    let channel = Arc::new(WebSocketChannel::new(&config, tls_connector));

    let provider = Provider::new(channel, config);
    provider.initialize().await?;

    let puzzle_hash_hex = "00".repeat(32);
    match provider.get_balance(None, Some(&puzzle_hash_hex), 0).await? {
        Some(balance) => println!("balance: {balance}"),
        None => println!("invalid address or puzzle hash"),
    }

    provider.close().await;
    Ok(())
}
