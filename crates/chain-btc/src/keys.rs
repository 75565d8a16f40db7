use bitcoin::key::{Keypair, UntweakedPublicKey};
use bitcoin::secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use bitcoin::{CompressedPublicKey, PrivateKey};
use zeroize::Zeroize;

use crate::error::BtcError;
use crate::network::BtcNetwork;

/// A secp256k1 key pair loaded from a raw 32-byte private key.
///
/// The same key backs all four script types; only the encoding of the
/// public key differs.
pub struct BtcKeyPair {
    secp: Secp256k1<All>,
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl BtcKeyPair {
    pub fn from_bytes(private_key: &[u8; 32]) -> Result<Self, BtcError> {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(private_key)
            .map_err(|e| BtcError::InvalidPrivateKey(format!("invalid secret key: {e}")))?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self {
            secp,
            secret_key,
            public_key,
        })
    }

    /// Parse a hex-encoded private key (an optional `0x` prefix is accepted).
    pub fn from_hex(private_key_hex: &str) -> Result<Self, BtcError> {
        let trimmed = private_key_hex.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let mut bytes = hex::decode(trimmed)
            .map_err(|e| BtcError::InvalidPrivateKey(format!("not hex: {e}")))?;

        let result = <[u8; 32]>::try_from(bytes.as_slice())
            .map_err(|_| {
                BtcError::InvalidPrivateKey(format!("expected 32 bytes, got {}", bytes.len()))
            })
            .and_then(|mut key| {
                let pair = Self::from_bytes(&key);
                key.zeroize();
                pair
            });
        bytes.zeroize();
        result
    }

    pub fn secp(&self) -> &Secp256k1<All> {
        &self.secp
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn compressed_public_key(&self) -> CompressedPublicKey {
        CompressedPublicKey(self.public_key)
    }

    /// Taproot internal key: the public key with its parity byte dropped.
    pub fn x_only_public_key(&self) -> UntweakedPublicKey {
        self.public_key.x_only_public_key().0
    }

    pub fn keypair(&self) -> Keypair {
        Keypair::from_secret_key(&self.secp, &self.secret_key)
    }

    /// Wallet Import Format encoding of the (compressed) private key.
    pub fn to_wif(&self, network: BtcNetwork) -> String {
        PrivateKey::new(self.secret_key, network.to_bitcoin_network()).to_wif()
    }
}

impl Drop for BtcKeyPair {
    fn drop(&mut self) {
        self.secret_key.non_secure_erase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn generator_point_for_key_one() {
        let pair = BtcKeyPair::from_hex(KEY_ONE).unwrap();
        assert_eq!(
            hex::encode(pair.public_key().serialize()),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
        assert_eq!(
            hex::encode(pair.x_only_public_key().serialize()),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn accepts_0x_prefix() {
        let a = BtcKeyPair::from_hex(KEY_ONE).unwrap();
        let b = BtcKeyPair::from_hex(&format!("0x{KEY_ONE}")).unwrap();
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn rejects_zero_key() {
        assert!(BtcKeyPair::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn rejects_wrong_length_and_non_hex() {
        assert!(BtcKeyPair::from_hex("abcd").is_err());
        assert!(BtcKeyPair::from_hex("zz").is_err());
    }

    #[test]
    fn wif_for_key_one() {
        let pair = BtcKeyPair::from_hex(KEY_ONE).unwrap();
        assert_eq!(
            pair.to_wif(BtcNetwork::Mainnet),
            "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn"
        );
        assert!(pair.to_wif(BtcNetwork::Testnet).starts_with('c'));
    }
}
