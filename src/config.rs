use crate::Network;

/// Connection parameters for a Leaflet provider. This is a plain data
/// structure handed in by the embedder — there is no file or CLI loader
/// here, that remains an external concern.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub network_id: String,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        let network = Network::mainnet();
        Self {
            host: host.into(),
            port: network.default_port,
            api_key: api_key.into(),
            network_id: network.network_id,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_network_id(mut self, network_id: impl Into<String>) -> Self {
        self.network_id = network_id.into();
        self
    }

    pub fn network(&self) -> Network {
        Network::by_id(&self.network_id)
    }

    pub fn uri(&self) -> String {
        format!("wss://{}:{}/ws", self.host, self.port)
    }
}
