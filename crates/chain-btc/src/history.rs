use serde::{Deserialize, Serialize};

use crate::source::{ChainOutput, ChainTransaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Send,
    Received,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxStatus {
    Pending,
    Success,
}

/// A transaction seen from one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    /// `None` when decoded without a reference address.
    pub direction: Option<Direction>,
    /// Net satoshis attributable to the address; `None` without one.
    pub value_sats: Option<u64>,
    pub fee_sats: u64,
    pub status: TxStatus,
    /// Zero while pending.
    pub block_timestamp: u64,
    /// Zero while pending.
    pub block_height: u64,
    pub explorer_url: String,
}

fn pays_to(output: &ChainOutput, address: &str) -> bool {
    output
        .scriptpubkey_address
        .as_deref()
        .is_some_and(|a| a.eq_ignore_ascii_case(address))
}

/// Classify `tx` relative to `address` and compute the net amount.
///
/// Send when the address funds any input: value is what it spent minus what
/// came back to it (amount sent plus fee). Otherwise Received: value is the
/// sum of outputs paying it.
pub fn classify(tx: &ChainTransaction, address: &str) -> (Direction, u64) {
    let spent: u64 = tx
        .vin
        .iter()
        .filter_map(|input| input.prevout.as_ref())
        .filter(|prevout| pays_to(prevout, address))
        .map(|prevout| prevout.value)
        .sum();
    let is_send = tx
        .vin
        .iter()
        .filter_map(|input| input.prevout.as_ref())
        .any(|prevout| pays_to(prevout, address));

    let returned: u64 = tx
        .vout
        .iter()
        .filter(|output| pays_to(output, address))
        .map(|output| output.value)
        .sum();

    if is_send {
        (Direction::Send, spent.saturating_sub(returned))
    } else {
        (Direction::Received, returned)
    }
}

/// Normalize one chain transaction into a record.
pub fn decode_transaction(
    tx: &ChainTransaction,
    address: Option<&str>,
    explorer_url: String,
) -> TransactionRecord {
    let (status, block_timestamp, block_height) = if tx.status.confirmed {
        (
            TxStatus::Success,
            tx.status.block_time.unwrap_or_default(),
            tx.status.block_height.unwrap_or_default(),
        )
    } else {
        (TxStatus::Pending, 0, 0)
    };

    let (direction, value_sats) = match address {
        Some(address) => {
            let (direction, value) = classify(tx, address);
            (Some(direction), Some(value))
        }
        None => (None, None),
    };

    TransactionRecord {
        hash: tx.txid.clone(),
        direction,
        value_sats,
        fee_sats: tx.fee,
        status,
        block_timestamp,
        block_height,
        explorer_url,
    }
}
