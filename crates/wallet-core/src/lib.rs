//! Bitcoin wallet transaction engine.
//!
//! Derives one account per script type from a seed or raw key, then funds,
//! signs and relays payments through a [`ChainSource`]. Stateless between
//! calls: keys arrive with each request and are dropped when it returns.

pub mod address;
pub mod error;
pub mod hd_derivation;
pub mod mnemonic;
pub mod send;
pub mod types;

use chain_btc::esplora::{EsploraClient, EsploraConfig};
use chain_btc::history::decode_transaction;
use chain_btc::source::ChainSource;
use chain_btc::utxo::confirmed_balance;

pub use address::{
    derive_accounts_from_private_key, derive_accounts_from_seed, private_key_to_wif,
    validate_address,
};
pub use chain_btc::address::{parse_payment_uri, PaymentUri};
pub use chain_btc::fee::{FeeRate, FeeRateTier, FeeTier};
pub use chain_btc::history::{Direction, TransactionRecord, TxStatus};
pub use chain_btc::utxo::Utxo;
pub use chain_btc::{BtcNetwork, ScriptType, SourceError};
pub use error::WalletError;
pub use mnemonic::{mnemonic_to_seed, validate_mnemonic};
pub use types::{Account, BroadcastResult, SignedTransaction, TransactionRequest};

/// Wallet operations bound to one chain source.
pub struct Wallet<S> {
    source: S,
}

impl Wallet<EsploraClient> {
    /// Wallet backed by an Esplora REST API.
    pub fn esplora(config: EsploraConfig) -> Result<Self, WalletError> {
        let client = EsploraClient::new(config).map_err(WalletError::SourceSetup)?;
        Ok(Self::new(client))
    }
}

impl<S: ChainSource> Wallet<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Confirmed balance in satoshis.
    ///
    /// A failed lookup reads as zero rather than an error.
    pub async fn get_balance(&self, network: BtcNetwork, address: &str) -> u64 {
        match self.source.utxos(network, address).await {
            Ok(utxos) => confirmed_balance(&utxos),
            Err(e) => {
                tracing::warn!(%network, %address, error = %e, "balance lookup failed");
                0
            }
        }
    }

    pub async fn get_fee_rates(&self, network: BtcNetwork) -> Result<FeeRateTier, WalletError> {
        self.source
            .fee_estimates(network)
            .await
            .map_err(WalletError::FeeEstimate)
    }

    /// Fund and sign without relaying.
    pub async fn build_signed_transaction(
        &self,
        network: BtcNetwork,
        request: &TransactionRequest,
    ) -> Result<SignedTransaction, WalletError> {
        send::build_signed_transaction(&self.source, network, request).await
    }

    /// Fund, sign and relay a payment.
    pub async fn build_and_send(
        &self,
        network: BtcNetwork,
        request: &TransactionRequest,
    ) -> Result<BroadcastResult, WalletError> {
        send::build_and_send(&self.source, network, request).await
    }

    /// Transactions touching `address`, newest first as the source orders them.
    ///
    /// A failed lookup yields an empty list.
    pub async fn get_transaction_history(
        &self,
        network: BtcNetwork,
        address: &str,
    ) -> Vec<TransactionRecord> {
        match self.source.address_transactions(network, address).await {
            Ok(txs) => txs
                .iter()
                .map(|tx| {
                    let url = self.source.explorer_tx_url(network, &tx.txid);
                    decode_transaction(tx, Some(address), url)
                })
                .collect(),
            Err(e) => {
                tracing::warn!(%network, %address, error = %e, "history lookup failed");
                Vec::new()
            }
        }
    }

    /// One transaction by hash, classified against `address` when given.
    pub async fn get_transaction(
        &self,
        network: BtcNetwork,
        hash: &str,
        address: Option<&str>,
    ) -> Result<TransactionRecord, WalletError> {
        let tx = self
            .source
            .transaction(network, hash)
            .await
            .map_err(WalletError::History)?;
        let url = self.source.explorer_tx_url(network, &tx.txid);
        Ok(decode_transaction(&tx, address, url))
    }
}
