use serde::{Deserialize, Serialize};

/// A single unspent transaction output (UTXO) as reported by the chain source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Transaction ID as a hex string (big-endian / display order).
    pub txid: String,
    /// Output index within the transaction.
    pub vout: u32,
    /// Value in satoshis.
    pub value_sats: u64,
    /// Whether the funding transaction is mined.
    pub confirmed: bool,
}

/// Keep only mined outputs; unconfirmed ones are never spent.
pub fn confirmed_only(utxos: Vec<Utxo>) -> Vec<Utxo> {
    utxos.into_iter().filter(|u| u.confirmed).collect()
}

/// Sum of confirmed output values, the authoritative balance.
pub fn confirmed_balance(utxos: &[Utxo]) -> u64 {
    utxos
        .iter()
        .filter(|u| u.confirmed)
        .map(|u| u.value_sats)
        .sum()
}
