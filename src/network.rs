/// Identifies which Chia network a connection targets, and the conventions
/// (default port, address human-readable part) that go with it.
///
/// Grounded on `chia_client::Network`, trimmed to what a single-peer wallet
/// adapter needs: no DNS introducers or genesis challenge, since this crate
/// never discovers peers or validates the chain itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub network_id: String,
    pub default_port: u16,
    pub address_hrp: String,
}

impl Network {
    pub fn mainnet() -> Self {
        Self {
            network_id: "mainnet".to_string(),
            default_port: 18444,
            address_hrp: "xch".to_string(),
        }
    }

    pub fn testnet(network_id: impl Into<String>) -> Self {
        Self {
            network_id: network_id.into(),
            default_port: 58444,
            address_hrp: "txch".to_string(),
        }
    }

    /// Resolves a network by the id string recognized in `ClientConfig`.
    pub fn by_id(network_id: &str) -> Self {
        if network_id == "mainnet" {
            Self::mainnet()
        } else {
            Self::testnet(network_id)
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::mainnet()
    }
}
