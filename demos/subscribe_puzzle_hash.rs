//! Subscribes to updates for one puzzle hash and prints every coin state
//! the full node pushes afterward.
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

    let puzzle_hash = [0_u8; 32];
    let mut updates = provider
        .subscribe_to_puzzle_hash_updates(vec![puzzle_hash], 0)
        .await?;

    while let Some(coin_states) = updates.recv().await {
        println!("received {} coin state(s)", coin_states.len());
    }

    Ok(())
}
