//! Fund, sign and relay one payment.
//!
//! Stages run strictly in order and any failure ends the call; nothing built
//! along the way outlives it. UTXOs are not reserved, so two sends from the
//! same address must not overlap.

use std::collections::HashMap;

use bitcoin::{Transaction, Txid};
use chain_btc::address::{key_pair_address, parse_address};
use chain_btc::fee::FeeRate;
use chain_btc::keys::BtcKeyPair;
use chain_btc::source::ChainSource;
use chain_btc::transaction::{self, TransactionDraft};
use chain_btc::utxo::confirmed_only;
use chain_btc::{BtcNetwork, ScriptType};
use secrecy::ExposeSecret;

use crate::error::WalletError;
use crate::types::{BroadcastResult, SignedTransaction, TransactionRequest};

/// Pipeline stage, logged on every transition.
///
/// `Done`, `Aborted` and `BroadcastFailed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Collecting,
    Sizing,
    Funding,
    Signing,
    Finalizing,
    Broadcasting,
    Done,
    /// Failed before anything was relayed.
    Aborted,
    BroadcastFailed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Collecting => "collecting",
            Stage::Sizing => "sizing",
            Stage::Funding => "funding",
            Stage::Signing => "signing",
            Stage::Finalizing => "finalizing",
            Stage::Broadcasting => "broadcasting",
            Stage::Done => "done",
            Stage::Aborted => "aborted",
            Stage::BroadcastFailed => "broadcast_failed",
        }
    }
}

fn enter(stage: Stage) {
    tracing::debug!(stage = stage.as_str(), "send stage");
}

/// Check the request and load the signing key.
fn validate_request(
    network: BtcNetwork,
    request: &TransactionRequest,
) -> Result<BtcKeyPair, WalletError> {
    if request.value_sats == 0 {
        return Err(WalletError::InvalidRequest("value must be positive".into()));
    }
    if let FeeRate::Custom(0) = request.fee_rate {
        return Err(WalletError::InvalidRequest("fee rate must be positive".into()));
    }

    let to = parse_address(&request.to_address, network)
        .map_err(|e| WalletError::AddressValidation(format!("destination: {e}")))?;
    let from = parse_address(&request.from_address, network)
        .map_err(|e| WalletError::AddressValidation(format!("source: {e}")))?;
    if to == from {
        return Err(WalletError::InvalidRequest(
            "destination equals source address".into(),
        ));
    }

    let key_pair = BtcKeyPair::from_hex(request.private_key.expose_secret())
        .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
    if key_pair_address(&key_pair, request.script_type, network) != from {
        return Err(WalletError::InvalidRequest(format!(
            "source address is not the {} address of the signing key",
            request.script_type.display_name()
        )));
    }
    Ok(key_pair)
}

async fn resolve_fee_rate<S: ChainSource + ?Sized>(
    source: &S,
    network: BtcNetwork,
    fee_rate: FeeRate,
) -> Result<u64, WalletError> {
    let tiers = match fee_rate {
        FeeRate::Custom(_) => None,
        FeeRate::Tier(_) => Some(
            source
                .fee_estimates(network)
                .await
                .map_err(WalletError::FeeEstimate)?,
        ),
    };
    fee_rate
        .resolve(tiers.as_ref())
        .ok_or_else(|| WalletError::InvalidRequest("no fee rate available".into()))
}

/// Fetch and decode the funding transaction of every legacy input.
async fn fetch_previous_transactions<S: ChainSource + ?Sized>(
    source: &S,
    network: BtcNetwork,
    draft: &TransactionDraft,
) -> Result<HashMap<Txid, Transaction>, WalletError> {
    let mut previous = HashMap::new();
    for utxo in &draft.inputs {
        let txid: Txid = utxo.txid.parse().map_err(|e| {
            WalletError::TransactionBuild(format!("invalid txid {}: {e}", utxo.txid))
        })?;
        if previous.contains_key(&txid) {
            continue;
        }
        let raw = source
            .raw_transaction(network, &utxo.txid)
            .await
            .map_err(WalletError::UtxoFetch)?;
        previous.insert(txid, transaction::decode_raw_transaction(&raw)?);
    }
    Ok(previous)
}

/// Everything up to and including finalization; nothing is relayed.
pub async fn build_signed_transaction<S: ChainSource + ?Sized>(
    source: &S,
    network: BtcNetwork,
    request: &TransactionRequest,
) -> Result<SignedTransaction, WalletError> {
    build_and_sign(source, network, request)
        .await
        .inspect_err(|_| enter(Stage::Aborted))
}

async fn build_and_sign<S: ChainSource + ?Sized>(
    source: &S,
    network: BtcNetwork,
    request: &TransactionRequest,
) -> Result<SignedTransaction, WalletError> {
    let key_pair = validate_request(network, request)?;

    enter(Stage::Collecting);
    let utxos = confirmed_only(
        source
            .utxos(network, &request.from_address)
            .await
            .map_err(WalletError::UtxoFetch)?,
    );

    enter(Stage::Sizing);
    let fee_rate = resolve_fee_rate(source, network, request.fee_rate).await?;

    enter(Stage::Funding);
    let draft = transaction::plan_transaction(
        &utxos,
        &request.from_address,
        &request.to_address,
        request.value_sats,
        fee_rate,
    )
    .inspect_err(|e| tracing::info!(%network, error = %e, "send aborted"))?;
    tracing::debug!(
        inputs = draft.inputs.len(),
        vsize = draft.estimated_vsize,
        fee_sats = draft.fee_sats,
        change_sats = draft.change_sats,
        "funded"
    );

    let previous_txs = match request.script_type {
        ScriptType::Legacy => fetch_previous_transactions(source, network, &draft).await?,
        ScriptType::NestedSegwit | ScriptType::NativeSegwit | ScriptType::Taproot => {
            HashMap::new()
        }
    };
    let unsigned = transaction::build_unsigned(
        &draft,
        &key_pair,
        request.script_type,
        network,
        &previous_txs,
    )?;

    enter(Stage::Signing);
    let signed = transaction::sign_transaction(&unsigned, &key_pair)?;

    enter(Stage::Finalizing);
    let raw_hex = transaction::serialize_hex(&signed);

    Ok(SignedTransaction {
        txid: signed.compute_txid().to_string(),
        raw_hex,
        fee_rate_sat_vbyte: fee_rate,
        draft,
    })
}

/// Build, sign and relay; returns the txid reported by the node.
pub async fn build_and_send<S: ChainSource + ?Sized>(
    source: &S,
    network: BtcNetwork,
    request: &TransactionRequest,
) -> Result<BroadcastResult, WalletError> {
    let signed = build_signed_transaction(source, network, request).await?;

    enter(Stage::Broadcasting);
    let txid = source
        .broadcast(network, &signed.raw_hex)
        .await
        .map_err(WalletError::broadcast)
        .inspect_err(|e| {
            enter(Stage::BroadcastFailed);
            tracing::warn!(%network, error = %e, "broadcast failed");
        })?;

    if txid != signed.txid {
        tracing::warn!(
            local = %signed.txid,
            remote = %txid,
            "node reported a different txid"
        );
    }

    enter(Stage::Done);
    tracing::info!(
        %network,
        %txid,
        script_type = %request.script_type,
        value_sats = request.value_sats,
        fee_sats = signed.draft.fee_sats,
        "transaction broadcast"
    );
    Ok(BroadcastResult { txid })
}
