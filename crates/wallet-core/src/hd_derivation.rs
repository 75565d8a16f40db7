use bip32::{DerivationPath, XPrv};
use chain_btc::{BtcNetwork, ScriptType};
use k256::ecdsa::SigningKey;
use zeroize::Zeroize;

use crate::error::WalletError;

/// BIP-44 style path: m/purpose'/coin_type'/account'/change/address_index
///
/// - Native SegWit: m/84'/c'/0'/0/0
/// - Nested SegWit: m/49'/c'/0'/0/0
/// - Taproot:       m/86'/c'/0'/0/0
/// - Legacy:        m/44'/c'/0'/0/0
///
/// `c` is 0 on mainnet and 1 on testnet.
pub fn derivation_path(
    script_type: ScriptType,
    network: BtcNetwork,
    account: u32,
    index: u32,
) -> String {
    format!(
        "m/{}'/{}'/{}'/0/{}",
        script_type.purpose(),
        network.coin_type(),
        account,
        index
    )
}

/// Derive a secp256k1 private key from seed using BIP-32
pub fn derive_secp256k1_key(
    seed: &[u8],
    script_type: ScriptType,
    network: BtcNetwork,
    account: u32,
    index: u32,
) -> Result<DerivedKey, WalletError> {
    let path_str = derivation_path(script_type, network, account, index);

    let path: DerivationPath = path_str
        .parse()
        .map_err(|e: bip32::Error| WalletError::KeyDerivation(e.to_string()))?;

    let xprv = XPrv::derive_from_path(seed, &path)
        .map_err(|e| WalletError::KeyDerivation(format!("{path_str}: {e}")))?;

    let mut private_key_bytes: [u8; 32] = xprv.to_bytes().into();
    let signing_key = SigningKey::from_bytes(&private_key_bytes.into())
        .map_err(|e| WalletError::KeyDerivation(e.to_string()));
    let signing_key = match signing_key {
        Ok(key) => key,
        Err(e) => {
            private_key_bytes.zeroize();
            return Err(e);
        }
    };

    let public_key_compressed: [u8; 33] = signing_key
        .verifying_key()
        .to_sec1_bytes()
        .as_ref()
        .try_into()
        .map_err(|_| WalletError::KeyDerivation("Invalid public key length".into()))?;

    Ok(DerivedKey {
        private_key: private_key_bytes,
        public_key_compressed,
        derivation_path: path_str,
    })
}

/// Derived secp256k1 key
pub struct DerivedKey {
    pub private_key: [u8; 32],
    pub public_key_compressed: [u8; 33],
    pub derivation_path: String,
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}
