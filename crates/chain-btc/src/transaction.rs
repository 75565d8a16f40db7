use std::collections::HashMap;

use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::key::{TapTweak, UntweakedPublicKey};
use bitcoin::script::{PushBytesBuf, ScriptBuf};
use bitcoin::secp256k1::Message;
use bitcoin::sighash::{EcdsaSighashType, Prevouts, SighashCache, TapSighashType};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use serde::{Deserialize, Serialize};

use crate::address::{address_to_script, key_pair_address};
use crate::error::BtcError;
use crate::fee::estimate_virtual_size;
use crate::keys::BtcKeyPair;
use crate::network::BtcNetwork;
use crate::script_type::ScriptType;
use crate::utxo::Utxo;

/// Outputs assumed when sizing: destination plus possible change.
pub const SIZING_OUTPUTS: usize = 2;

/// One output of a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOutput {
    pub address: String,
    pub value_sats: u64,
}

/// Inputs, outputs and fee of a transaction before any key is touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub inputs: Vec<Utxo>,
    /// Destination first, then change if any.
    pub outputs: Vec<DraftOutput>,
    pub estimated_vsize: u64,
    pub fee_sats: u64,
    pub change_sats: u64,
}

impl TransactionDraft {
    pub fn total_input_sats(&self) -> u64 {
        self.inputs.iter().map(|u| u.value_sats).sum()
    }

    pub fn has_change(&self) -> bool {
        self.change_sats > 0
    }
}

/// Script-specific data needed to sign one input.
#[derive(Debug, Clone)]
pub enum SpendInfo {
    NativeSegwit {
        witness_utxo: TxOut,
    },
    NestedSegwit {
        witness_utxo: TxOut,
        redeem_script: ScriptBuf,
    },
    Taproot {
        witness_utxo: TxOut,
        internal_key: UntweakedPublicKey,
    },
    /// Legacy sighashes need the whole funding transaction.
    Legacy {
        previous_tx: Box<Transaction>,
        vout: u32,
    },
}

impl SpendInfo {
    /// The output being spent.
    pub fn prevout(&self) -> Result<TxOut, BtcError> {
        match self {
            SpendInfo::NativeSegwit { witness_utxo }
            | SpendInfo::NestedSegwit { witness_utxo, .. }
            | SpendInfo::Taproot { witness_utxo, .. } => Ok(witness_utxo.clone()),
            SpendInfo::Legacy { previous_tx, vout } => previous_tx
                .output
                .get(*vout as usize)
                .cloned()
                .ok_or_else(|| {
                    BtcError::TransactionBuildError(format!(
                        "previous transaction has no output {vout}"
                    ))
                }),
        }
    }
}

/// An unsigned Bitcoin transaction ready for signing.
#[derive(Debug, Clone)]
pub struct UnsignedBtcTx {
    pub script_type: ScriptType,
    /// The transaction with empty script_sigs and witnesses.
    pub tx: Transaction,
    /// Signing data, in the same order as the transaction inputs.
    pub spend_info: Vec<SpendInfo>,
}

/// Size the transaction and split the inputs into destination and change.
///
/// Every UTXO passed in is spent; there is no coin selection. The fee is
/// sized for two outputs even when change ends up omitted, and change is
/// dropped only when it is exactly zero.
pub fn plan_transaction(
    utxos: &[Utxo],
    from_address: &str,
    to_address: &str,
    value_sats: u64,
    fee_rate_sat_vbyte: u64,
) -> Result<TransactionDraft, BtcError> {
    let total_input_sats: u64 = utxos.iter().map(|u| u.value_sats).sum();
    let estimated_vsize = estimate_virtual_size(utxos.len(), SIZING_OUTPUTS);
    let fee_sats = estimated_vsize.checked_mul(fee_rate_sat_vbyte).ok_or_else(|| {
        BtcError::TransactionBuildError(format!("fee overflows at {fee_rate_sat_vbyte} sat/vB"))
    })?;
    let required = value_sats
        .checked_add(fee_sats)
        .ok_or_else(|| BtcError::TransactionBuildError("amount plus fee overflows".into()))?;

    if total_input_sats < required {
        return Err(BtcError::InsufficientFunds {
            available: total_input_sats,
            required,
        });
    }
    let change_sats = total_input_sats - required;

    let mut outputs = vec![DraftOutput {
        address: to_address.to_string(),
        value_sats,
    }];
    if change_sats > 0 {
        outputs.push(DraftOutput {
            address: from_address.to_string(),
            value_sats: change_sats,
        });
    }

    Ok(TransactionDraft {
        inputs: utxos.to_vec(),
        outputs,
        estimated_vsize,
        fee_sats,
        change_sats,
    })
}

/// Decode a consensus-serialized transaction from hex.
pub fn decode_raw_transaction(raw_hex: &str) -> Result<Transaction, BtcError> {
    let bytes = hex::decode(raw_hex.trim())
        .map_err(|e| BtcError::TransactionBuildError(format!("raw transaction is not hex: {e}")))?;
    bitcoin::consensus::deserialize(&bytes)
        .map_err(|e| BtcError::TransactionBuildError(format!("invalid raw transaction: {e}")))
}

/// Turn a draft into an unsigned transaction carrying per-input spend data.
///
/// `previous_txs` must hold the funding transaction of every input when
/// `script_type` is [`ScriptType::Legacy`]; it is ignored otherwise.
pub fn build_unsigned(
    draft: &TransactionDraft,
    key_pair: &BtcKeyPair,
    script_type: ScriptType,
    network: BtcNetwork,
    previous_txs: &HashMap<Txid, Transaction>,
) -> Result<UnsignedBtcTx, BtcError> {
    let own_script = key_pair_address(key_pair, script_type, network).script_pubkey();

    let mut inputs = Vec::with_capacity(draft.inputs.len());
    let mut spend_info = Vec::with_capacity(draft.inputs.len());

    for utxo in &draft.inputs {
        let txid: Txid = utxo
            .txid
            .parse()
            .map_err(|e| BtcError::TransactionBuildError(format!("invalid txid: {e}")))?;

        inputs.push(TxIn {
            previous_output: OutPoint::new(txid, utxo.vout),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness: Witness::default(),
        });

        let witness_utxo = TxOut {
            value: Amount::from_sat(utxo.value_sats),
            script_pubkey: own_script.clone(),
        };

        let info = match script_type {
            ScriptType::NativeSegwit => SpendInfo::NativeSegwit { witness_utxo },
            ScriptType::NestedSegwit => SpendInfo::NestedSegwit {
                witness_utxo,
                redeem_script: ScriptBuf::new_p2wpkh(
                    &key_pair.compressed_public_key().wpubkey_hash(),
                ),
            },
            ScriptType::Taproot => SpendInfo::Taproot {
                witness_utxo,
                internal_key: key_pair.x_only_public_key(),
            },
            ScriptType::Legacy => {
                let previous_tx = previous_txs.get(&txid).ok_or_else(|| {
                    BtcError::TransactionBuildError(format!(
                        "missing previous transaction {txid} for legacy input"
                    ))
                })?;
                if previous_tx.compute_txid() != txid {
                    return Err(BtcError::TransactionBuildError(format!(
                        "previous transaction does not hash to {txid}"
                    )));
                }
                let info = SpendInfo::Legacy {
                    previous_tx: Box::new(previous_tx.clone()),
                    vout: utxo.vout,
                };
                // The draft's fee was sized from the reported value.
                let prevout = info.prevout()?;
                if prevout.value.to_sat() != utxo.value_sats {
                    return Err(BtcError::TransactionBuildError(format!(
                        "output {txid}:{} holds {} sat, source reported {} sat",
                        utxo.vout,
                        prevout.value.to_sat(),
                        utxo.value_sats
                    )));
                }
                info
            }
        };
        spend_info.push(info);
    }

    let mut outputs = Vec::with_capacity(draft.outputs.len());
    for output in &draft.outputs {
        outputs.push(TxOut {
            value: Amount::from_sat(output.value_sats),
            script_pubkey: address_to_script(&output.address, network)?,
        });
    }

    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs,
        output: outputs,
    };

    Ok(UnsignedBtcTx {
        script_type,
        tx,
        spend_info,
    })
}

/// Sign and finalize every input with `key_pair`.
///
/// Taproot inputs are signed with the key tweaked by the TapTweak tagged hash
/// of the internal key (BIP-86 key-path spend, `SIGHASH_DEFAULT`). All other
/// inputs use the untweaked key with `SIGHASH_ALL`.
pub fn sign_transaction(
    unsigned_tx: &UnsignedBtcTx,
    key_pair: &BtcKeyPair,
) -> Result<Transaction, BtcError> {
    if unsigned_tx.spend_info.len() != unsigned_tx.tx.input.len() {
        return Err(BtcError::SigningError(format!(
            "{} inputs but {} spend records",
            unsigned_tx.tx.input.len(),
            unsigned_tx.spend_info.len()
        )));
    }

    let mut signed_tx = unsigned_tx.tx.clone();
    match unsigned_tx.script_type {
        ScriptType::Taproot => sign_taproot_inputs(unsigned_tx, key_pair, &mut signed_tx)?,
        ScriptType::Legacy | ScriptType::NestedSegwit | ScriptType::NativeSegwit => {
            sign_ecdsa_inputs(unsigned_tx, key_pair, &mut signed_tx)?
        }
    }
    Ok(signed_tx)
}

fn sign_ecdsa_inputs(
    unsigned_tx: &UnsignedBtcTx,
    key_pair: &BtcKeyPair,
    signed_tx: &mut Transaction,
) -> Result<(), BtcError> {
    let mut sighash_cache = SighashCache::new(&unsigned_tx.tx);
    let public_key = key_pair.public_key();

    for (input_index, info) in unsigned_tx.spend_info.iter().enumerate() {
        match info {
            SpendInfo::NativeSegwit { witness_utxo } => {
                let sighash = sighash_cache
                    .p2wpkh_signature_hash(
                        input_index,
                        &witness_utxo.script_pubkey,
                        witness_utxo.value,
                        EcdsaSighashType::All,
                    )
                    .map_err(|e| {
                        BtcError::SigningError(format!("sighash computation failed: {e}"))
                    })?;
                let sig_bytes = ecdsa_signature(key_pair, sighash.to_byte_array());

                let mut witness = Witness::new();
                witness.push(&sig_bytes);
                witness.push(public_key.serialize());
                signed_tx.input[input_index].witness = witness;
            }
            SpendInfo::NestedSegwit {
                witness_utxo,
                redeem_script,
            } => {
                let sighash = sighash_cache
                    .p2wpkh_signature_hash(
                        input_index,
                        redeem_script,
                        witness_utxo.value,
                        EcdsaSighashType::All,
                    )
                    .map_err(|e| {
                        BtcError::SigningError(format!("sighash computation failed: {e}"))
                    })?;
                let sig_bytes = ecdsa_signature(key_pair, sighash.to_byte_array());

                let redeem_push = PushBytesBuf::try_from(redeem_script.to_bytes())
                    .map_err(|e| BtcError::SigningError(format!("redeem script push: {e}")))?;
                signed_tx.input[input_index].script_sig =
                    ScriptBuf::builder().push_slice(redeem_push).into_script();

                let mut witness = Witness::new();
                witness.push(&sig_bytes);
                witness.push(public_key.serialize());
                signed_tx.input[input_index].witness = witness;
            }
            SpendInfo::Legacy { .. } => {
                let prevout = info.prevout()?;
                let sighash = sighash_cache
                    .legacy_signature_hash(
                        input_index,
                        &prevout.script_pubkey,
                        EcdsaSighashType::All.to_u32(),
                    )
                    .map_err(|e| {
                        BtcError::SigningError(format!("sighash computation failed: {e}"))
                    })?;
                let sig_bytes = ecdsa_signature(key_pair, sighash.to_byte_array());

                let sig_push = PushBytesBuf::try_from(sig_bytes)
                    .map_err(|e| BtcError::SigningError(format!("signature push: {e}")))?;
                signed_tx.input[input_index].script_sig = ScriptBuf::builder()
                    .push_slice(sig_push)
                    .push_key(&bitcoin::PublicKey::new(public_key))
                    .into_script();
            }
            SpendInfo::Taproot { .. } => {
                return Err(BtcError::SigningError(
                    "taproot input in an ECDSA-signed transaction".into(),
                ));
            }
        }
    }
    Ok(())
}

/// DER signature with the `SIGHASH_ALL` byte appended.
fn ecdsa_signature(key_pair: &BtcKeyPair, digest: [u8; 32]) -> Vec<u8> {
    let msg = Message::from_digest(digest);
    let signature = key_pair.secp().sign_ecdsa(&msg, key_pair.secret_key());

    let mut sig_bytes = signature.serialize_der().to_vec();
    sig_bytes.push(EcdsaSighashType::All as u8);
    sig_bytes
}

fn sign_taproot_inputs(
    unsigned_tx: &UnsignedBtcTx,
    key_pair: &BtcKeyPair,
    signed_tx: &mut Transaction,
) -> Result<(), BtcError> {
    let prevouts = unsigned_tx
        .spend_info
        .iter()
        .map(SpendInfo::prevout)
        .collect::<Result<Vec<_>, _>>()?;

    let secp = key_pair.secp();
    let tweaked = key_pair.keypair().tap_tweak(secp, None).to_keypair();
    let mut sighash_cache = SighashCache::new(&unsigned_tx.tx);

    for (input_index, info) in unsigned_tx.spend_info.iter().enumerate() {
        let SpendInfo::Taproot { internal_key, .. } = info else {
            return Err(BtcError::SigningError(
                "non-taproot input in a taproot transaction".into(),
            ));
        };
        if *internal_key != key_pair.x_only_public_key() {
            return Err(BtcError::SigningError(format!(
                "input {input_index} has a foreign internal key"
            )));
        }

        let sighash = sighash_cache
            .taproot_key_spend_signature_hash(
                input_index,
                &Prevouts::All(&prevouts),
                TapSighashType::Default,
            )
            .map_err(|e| BtcError::SigningError(format!("taproot sighash failed: {e}")))?;

        let msg = Message::from_digest(sighash.to_byte_array());
        let signature = secp.sign_schnorr_no_aux_rand(&msg, &tweaked);

        signed_tx.input[input_index].witness =
            Witness::p2tr_key_spend(&bitcoin::taproot::Signature {
                signature,
                sighash_type: TapSighashType::Default,
            });
    }
    Ok(())
}

/// Consensus-serialize a transaction to hex.
pub fn serialize_hex(tx: &Transaction) -> String {
    bitcoin::consensus::encode::serialize_hex(tx)
}
