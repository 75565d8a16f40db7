//! Chain-data access seam.
//!
//! Everything the wallet needs from the outside world goes through
//! [`ChainSource`]. [`crate::esplora::EsploraClient`] talks to an
//! Esplora-compatible REST API; tests plug in an in-memory source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::fee::FeeRateTier;
use crate::network::BtcNetwork;
use crate::utxo::Utxo;

/// A transaction as reported by the chain source, with resolved prevouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTransaction {
    pub txid: String,
    pub vin: Vec<ChainInput>,
    pub vout: Vec<ChainOutput>,
    /// Absolute fee in satoshis.
    #[serde(default)]
    pub fee: u64,
    pub status: ChainTxStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInput {
    /// Spent output; absent for coinbase inputs.
    #[serde(default)]
    pub prevout: Option<ChainOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainOutput {
    /// Absent for non-standard and OP_RETURN outputs.
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
    pub value: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTxStatus {
    pub confirmed: bool,
    #[serde(default)]
    pub block_height: Option<u64>,
    #[serde(default)]
    pub block_time: Option<u64>,
}

/// Remote chain data and relay.
///
/// Implementations hold no per-request state; every call names its network.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// All unspent outputs paying to `address`, confirmed or not.
    async fn utxos(&self, network: BtcNetwork, address: &str) -> Result<Vec<Utxo>, SourceError>;

    /// Consensus-serialized transaction as hex.
    async fn raw_transaction(&self, network: BtcNetwork, txid: &str)
        -> Result<String, SourceError>;

    async fn fee_estimates(&self, network: BtcNetwork) -> Result<FeeRateTier, SourceError>;

    /// Relay a signed transaction; returns the txid assigned by the node.
    async fn broadcast(&self, network: BtcNetwork, raw_hex: &str) -> Result<String, SourceError>;

    async fn address_transactions(
        &self,
        network: BtcNetwork,
        address: &str,
    ) -> Result<Vec<ChainTransaction>, SourceError>;

    async fn transaction(
        &self,
        network: BtcNetwork,
        txid: &str,
    ) -> Result<ChainTransaction, SourceError>;

    /// Link to a transaction in a block explorer.
    fn explorer_tx_url(&self, network: BtcNetwork, txid: &str) -> String {
        format!("{}/tx/{}", network.default_explorer_url(), txid)
    }
}
