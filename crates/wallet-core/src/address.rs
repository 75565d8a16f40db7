use chain_btc::address::{key_pair_address, pubkey_to_address};
use chain_btc::keys::BtcKeyPair;
use chain_btc::{BtcNetwork, ScriptType};
use secrecy::SecretString;

use crate::error::WalletError;
use crate::hd_derivation;
use crate::types::Account;

/// Derive one account per script type from a BIP-32 seed.
///
/// Accounts come back in [`ScriptType::ALL`] order. Any failure aborts the
/// whole derivation.
pub fn derive_accounts_from_seed(
    network: BtcNetwork,
    seed: &[u8],
) -> Result<Vec<Account>, WalletError> {
    ScriptType::ALL
        .iter()
        .map(|&script_type| derive_account(seed, script_type, network))
        .collect()
}

fn derive_account(
    seed: &[u8],
    script_type: ScriptType,
    network: BtcNetwork,
) -> Result<Account, WalletError> {
    let key = hd_derivation::derive_secp256k1_key(seed, script_type, network, 0, 0)?;

    let address = pubkey_to_address(&key.public_key_compressed, script_type, network)
        .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;

    Ok(Account {
        script_type,
        address,
        private_key: SecretString::from(hex::encode(key.private_key)),
        network,
        derivation_path: Some(key.derivation_path.clone()),
    })
}

/// Encode one raw private key four ways, one account per script type.
pub fn derive_accounts_from_private_key(
    network: BtcNetwork,
    private_key_hex: &str,
) -> Result<Vec<Account>, WalletError> {
    let key_pair = BtcKeyPair::from_hex(private_key_hex)
        .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;

    Ok(ScriptType::ALL
        .iter()
        .map(|&script_type| Account {
            script_type,
            address: key_pair_address(&key_pair, script_type, network).to_string(),
            private_key: SecretString::from(hex::encode(key_pair.secret_key().secret_bytes())),
            network,
            derivation_path: None,
        })
        .collect())
}

/// Whether `address` is a valid encoding on `network`.
pub fn validate_address(network: BtcNetwork, address: &str) -> bool {
    chain_btc::address::validate_address(address, network)
}

/// Export a hex private key as WIF for `network`.
pub fn private_key_to_wif(
    network: BtcNetwork,
    private_key_hex: &str,
) -> Result<String, WalletError> {
    let key_pair = BtcKeyPair::from_hex(private_key_hex)
        .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
    Ok(key_pair.to_wif(network))
}
