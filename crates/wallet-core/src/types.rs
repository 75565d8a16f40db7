use chain_btc::fee::FeeRate;
use chain_btc::transaction::TransactionDraft;
use chain_btc::{BtcNetwork, ScriptType};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// One script-type view of a key. Never persisted by the core.
#[derive(Debug)]
pub struct Account {
    pub script_type: ScriptType,
    pub address: String,
    /// Lowercase hex of the 32-byte private key.
    pub private_key: SecretString,
    pub network: BtcNetwork,
    /// Set only for seed-derived accounts.
    pub derivation_path: Option<String>,
}

impl Account {
    pub fn private_key_hex(&self) -> &str {
        self.private_key.expose_secret()
    }
}

/// Everything needed to fund, sign and relay one payment.
#[derive(Debug)]
pub struct TransactionRequest {
    pub from_address: String,
    pub to_address: String,
    pub value_sats: u64,
    pub script_type: ScriptType,
    /// Defaults to the oracle's fastest tier.
    pub fee_rate: FeeRate,
    pub private_key: SecretString,
}

impl TransactionRequest {
    pub fn new(
        from_address: impl Into<String>,
        to_address: impl Into<String>,
        value_sats: u64,
        script_type: ScriptType,
        private_key_hex: impl Into<String>,
    ) -> Self {
        Self {
            from_address: from_address.into(),
            to_address: to_address.into(),
            value_sats,
            script_type,
            fee_rate: FeeRate::default(),
            private_key: SecretString::from(private_key_hex.into()),
        }
    }

    /// Pay an explicit sat/vB rate instead of asking the fee oracle.
    pub fn with_fee_rate(mut self, sat_per_vbyte: u64) -> Self {
        self.fee_rate = FeeRate::Custom(sat_per_vbyte);
        self
    }

    pub fn with_fee_tier(mut self, fee_rate: FeeRate) -> Self {
        self.fee_rate = fee_rate;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub txid: String,
}

/// A fully signed transaction that has not been relayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub txid: String,
    pub raw_hex: String,
    pub fee_rate_sat_vbyte: u64,
    pub draft: TransactionDraft,
}
