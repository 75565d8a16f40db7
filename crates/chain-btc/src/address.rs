use std::sync::LazyLock;

use bitcoin::address::{Address, NetworkUnchecked};
use bitcoin::key::UntweakedPublicKey;
use bitcoin::secp256k1::{Secp256k1, Verification};
use bitcoin::{CompressedPublicKey, ScriptBuf};
use regex::Regex;

use crate::error::BtcError;
use crate::keys::BtcKeyPair;
use crate::network::BtcNetwork;
use crate::script_type::ScriptType;

/// Encode a compressed secp256k1 public key as an address of the given type.
///
/// Pure and deterministic: the same `(pubkey, script_type, network)` always
/// yields the same string.
pub fn pubkey_to_address(
    pubkey_bytes: &[u8; 33],
    script_type: ScriptType,
    network: BtcNetwork,
) -> Result<String, BtcError> {
    let compressed_pk = CompressedPublicKey::from_slice(pubkey_bytes).map_err(|e| {
        BtcError::InvalidPublicKey(format!("failed to parse compressed public key: {e}"))
    })?;

    let secp = Secp256k1::verification_only();
    Ok(encode(&secp, &compressed_pk, script_type, network).to_string())
}

/// Address of `key_pair` for the given script type.
pub fn key_pair_address(
    key_pair: &BtcKeyPair,
    script_type: ScriptType,
    network: BtcNetwork,
) -> Address {
    encode(
        key_pair.secp(),
        &key_pair.compressed_public_key(),
        script_type,
        network,
    )
}

fn encode<C: Verification>(
    secp: &Secp256k1<C>,
    compressed_pk: &CompressedPublicKey,
    script_type: ScriptType,
    network: BtcNetwork,
) -> Address {
    let net = network.to_bitcoin_network();
    match script_type {
        ScriptType::Legacy => Address::p2pkh(compressed_pk.pubkey_hash(), net),
        ScriptType::NestedSegwit => Address::p2shwpkh(compressed_pk, net),
        ScriptType::NativeSegwit => Address::p2wpkh(compressed_pk, net),
        ScriptType::Taproot => {
            let internal_key: UntweakedPublicKey = compressed_pk.0.x_only_public_key().0;
            Address::p2tr(secp, internal_key, None, net)
        }
    }
}

/// Parse an address and require that it belongs to `network`.
pub fn parse_address(address: &str, network: BtcNetwork) -> Result<Address, BtcError> {
    address
        .trim()
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| BtcError::InvalidAddress(format!("failed to parse address: {e}")))?
        .require_network(network.to_bitcoin_network())
        .map_err(|e| BtcError::InvalidAddress(format!("wrong network for {network}: {e}")))
}

/// Locking script for an address on `network`.
pub fn address_to_script(address: &str, network: BtcNetwork) -> Result<ScriptBuf, BtcError> {
    Ok(parse_address(address, network)?.script_pubkey())
}

/// Validate a Bitcoin address string for the given network.
///
/// Any standard encoding (P2PKH, P2SH, P2WPKH, P2WSH, P2TR) is accepted.
/// Garbage and addresses of the other network both return `false`.
pub fn validate_address(address: &str, network: BtcNetwork) -> bool {
    parse_address(address, network).is_ok()
}

/// Address and amount decoded from a `bitcoin:` payment URI.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentUri {
    pub address: String,
    /// Amount in BTC, exactly as written in the URI.
    pub amount: String,
}

static PAYMENT_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"bitcoin:(\w+)\?amount=([\d.]+)").expect("payment URI pattern is a valid regex")
});

/// Decode `bitcoin:<address>?amount=<btc>` (as rendered into QR codes).
///
/// Only the shape is checked; validate the address separately.
pub fn parse_payment_uri(text: &str) -> Option<PaymentUri> {
    let captures = PAYMENT_URI.captures(text)?;
    Some(PaymentUri {
        address: captures.get(1)?.as_str().to_string(),
        amount: captures.get(2)?.as_str().to_string(),
    })
}
