use bitcoin::Network;
use serde::{Deserialize, Serialize};

/// Default Esplora-compatible API for Bitcoin mainnet.
pub const MAINNET_API: &str = "https://mempool.space/api";

/// Default Esplora-compatible API for Bitcoin testnet.
pub const TESTNET_API: &str = "https://mempool.space/testnet/api";

/// Default block explorer for Bitcoin mainnet.
pub const MAINNET_EXPLORER: &str = "https://mempool.space";

/// Default block explorer for Bitcoin testnet.
pub const TESTNET_EXPLORER: &str = "https://mempool.space/testnet";

/// Supported Bitcoin networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BtcNetwork {
    Mainnet,
    Testnet,
}

impl BtcNetwork {
    /// Convert to the `bitcoin` crate's `Network` type.
    pub fn to_bitcoin_network(self) -> Network {
        match self {
            BtcNetwork::Mainnet => Network::Bitcoin,
            BtcNetwork::Testnet => Network::Testnet,
        }
    }

    /// BIP-44 coin type used in derivation paths.
    pub fn coin_type(self) -> u32 {
        match self {
            BtcNetwork::Mainnet => 0,
            BtcNetwork::Testnet => 1,
        }
    }

    /// Return the default chain-data API for this network.
    pub fn default_api_url(self) -> &'static str {
        match self {
            BtcNetwork::Mainnet => MAINNET_API,
            BtcNetwork::Testnet => TESTNET_API,
        }
    }

    /// Return the default block explorer for this network.
    pub fn default_explorer_url(self) -> &'static str {
        match self {
            BtcNetwork::Mainnet => MAINNET_EXPLORER,
            BtcNetwork::Testnet => TESTNET_EXPLORER,
        }
    }
}

impl std::fmt::Display for BtcNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BtcNetwork::Mainnet => write!(f, "mainnet"),
            BtcNetwork::Testnet => write!(f, "testnet"),
        }
    }
}

impl std::str::FromStr for BtcNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" => Ok(BtcNetwork::Mainnet),
            "testnet" => Ok(BtcNetwork::Testnet),
            other => Err(format!("unknown network: {other}")),
        }
    }
}
