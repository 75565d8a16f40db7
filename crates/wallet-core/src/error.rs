use chain_btc::{BtcError, SourceError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Failed to fetch UTXOs: {0}")]
    UtxoFetch(#[source] SourceError),

    #[error("Insufficient funds: have {available} sat, need {required} sat")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("Unsupported script type: {0}")]
    UnsupportedScriptType(String),

    #[error("Broadcast rejected: {reason}")]
    Broadcast {
        reason: String,
        #[source]
        source: SourceError,
    },

    #[error("Invalid address: {0}")]
    AddressValidation(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to fetch fee estimates: {0}")]
    FeeEstimate(#[source] SourceError),

    #[error("Transaction build failed: {0}")]
    TransactionBuild(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Failed to fetch transaction: {0}")]
    History(#[source] SourceError),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Chain source setup failed: {0}")]
    SourceSetup(#[source] SourceError),
}

impl WalletError {
    /// Wrap a relay failure, keeping the node's own wording when it gave one.
    pub fn broadcast(source: SourceError) -> Self {
        let reason = source
            .remote_reason()
            .map(str::to_string)
            .unwrap_or_else(|| source.to_string());
        WalletError::Broadcast { reason, source }
    }

    /// Whether resubmitting the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WalletError::UtxoFetch(_) | WalletError::FeeEstimate(_) | WalletError::History(_)
        )
    }
}

impl From<BtcError> for WalletError {
    fn from(e: BtcError) -> Self {
        match e {
            BtcError::InvalidPrivateKey(_) | BtcError::InvalidPublicKey(_) => {
                WalletError::KeyDerivation(e.to_string())
            }
            BtcError::InvalidAddress(msg) => WalletError::AddressValidation(msg),
            BtcError::UnsupportedScriptType(tag) => WalletError::UnsupportedScriptType(tag),
            BtcError::TransactionBuildError(msg) => WalletError::TransactionBuild(msg),
            BtcError::InsufficientFunds {
                available,
                required,
            } => WalletError::InsufficientFunds {
                available,
                required,
            },
            BtcError::SigningError(msg) => WalletError::Signing(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_funds_maps_through() {
        let err: WalletError = BtcError::InsufficientFunds {
            available: 10,
            required: 20,
        }
        .into();
        assert!(matches!(
            err,
            WalletError::InsufficientFunds {
                available: 10,
                required: 20
            }
        ));
    }

    #[test]
    fn key_errors_become_derivation_errors() {
        let err: WalletError = BtcError::InvalidPrivateKey("zero".into()).into();
        assert!(matches!(err, WalletError::KeyDerivation(ref m) if m.contains("zero")));
    }

    #[test]
    fn unsupported_script_type_keeps_tag() {
        let err: WalletError = BtcError::UnsupportedScriptType("P2WSH".into()).into();
        assert_eq!(err.to_string(), "Unsupported script type: P2WSH");
    }

    #[test]
    fn broadcast_prefers_remote_reason() {
        let err = WalletError::broadcast(SourceError::Status {
            url: "https://example.invalid/api/tx".into(),
            status: 400,
            body: "bad-txns-inputs-missingorspent".into(),
        });
        assert_eq!(err.to_string(), "Broadcast rejected: bad-txns-inputs-missingorspent");
        assert!(!err.is_retryable());
    }

    #[test]
    fn broadcast_without_body_uses_transport_error() {
        let err = WalletError::broadcast(SourceError::Timeout {
            url: "https://example.invalid/api/tx".into(),
        });
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn fetch_errors_are_retryable() {
        let err = WalletError::UtxoFetch(SourceError::Timeout {
            url: "https://example.invalid".into(),
        });
        assert!(err.is_retryable());
    }
}
