use serde::{Deserialize, Serialize};

use crate::error::BtcError;

/// Output script family an account receives to and spends from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScriptType {
    /// P2PKH (`1...` / `m...`).
    Legacy,
    /// P2SH-wrapped P2WPKH (`3...` / `2...`).
    NestedSegwit,
    /// P2WPKH (`bc1q...` / `tb1q...`).
    NativeSegwit,
    /// P2TR key-path (`bc1p...` / `tb1p...`).
    Taproot,
}

impl ScriptType {
    /// Derivation order for a freshly imported seed or key.
    pub const ALL: [ScriptType; 4] = [
        ScriptType::NativeSegwit,
        ScriptType::NestedSegwit,
        ScriptType::Taproot,
        ScriptType::Legacy,
    ];

    /// BIP-43 purpose field: 44, 49, 84 or 86.
    pub fn purpose(self) -> u32 {
        match self {
            ScriptType::Legacy => 44,
            ScriptType::NestedSegwit => 49,
            ScriptType::NativeSegwit => 84,
            ScriptType::Taproot => 86,
        }
    }

    /// Canonical tag used on the wire by callers.
    pub fn tag(self) -> &'static str {
        match self {
            ScriptType::Legacy => "LEGACY",
            ScriptType::NestedSegwit => "NESTEDSEGWIT",
            ScriptType::NativeSegwit => "NATIVESEGWIT",
            ScriptType::Taproot => "TAPROOT",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ScriptType::Legacy => "Legacy",
            ScriptType::NestedSegwit => "Nested Segwit",
            ScriptType::NativeSegwit => "Native Segwit",
            ScriptType::Taproot => "Taproot",
        }
    }
}

impl std::fmt::Display for ScriptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for ScriptType {
    type Err = BtcError;

    /// Accepts the canonical tag or the display name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "LEGACY" => Ok(ScriptType::Legacy),
            "NESTEDSEGWIT" => Ok(ScriptType::NestedSegwit),
            "NATIVESEGWIT" => Ok(ScriptType::NativeSegwit),
            "TAPROOT" => Ok(ScriptType::Taproot),
            _ => Err(BtcError::UnsupportedScriptType(s.to_string())),
        }
    }
}
