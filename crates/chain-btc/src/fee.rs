use serde::{Deserialize, Serialize};

/// Fixed transaction overhead in quarter-vbytes (10.5 vB).
const TX_OVERHEAD_QUARTER_VBYTES: u64 = 42;

/// Per-input size in quarter-vbytes (41 vB + 16.25 vB witness share = 57.25 vB).
const INPUT_QUARTER_VBYTES: u64 = 229;

/// Per-output size in quarter-vbytes (43 vB).
const OUTPUT_QUARTER_VBYTES: u64 = 172;

/// Recommended fee rates in sat/vB, as served by the fee oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRateTier {
    #[serde(rename = "fastestFee")]
    pub fastest: u64,
    #[serde(rename = "halfHourFee")]
    pub half_hour: u64,
    #[serde(rename = "hourFee")]
    pub hour: u64,
    #[serde(rename = "economyFee")]
    pub economy: u64,
    #[serde(rename = "minimumFee")]
    pub minimum: u64,
}

/// Named fee tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeTier {
    Fastest,
    HalfHour,
    Hour,
    Economy,
    Minimum,
}

impl FeeRateTier {
    pub fn rate(&self, tier: FeeTier) -> u64 {
        match tier {
            FeeTier::Fastest => self.fastest,
            FeeTier::HalfHour => self.half_hour,
            FeeTier::Hour => self.hour,
            FeeTier::Economy => self.economy,
            FeeTier::Minimum => self.minimum,
        }
    }
}

/// How the caller wants the fee rate chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeRate {
    Tier(FeeTier),
    /// Explicit sat/vB rate.
    Custom(u64),
}

impl FeeRate {
    /// Resolve to sat/vB. A custom rate never consults the tiers.
    pub fn resolve(self, tiers: Option<&FeeRateTier>) -> Option<u64> {
        match self {
            FeeRate::Custom(rate) => Some(rate),
            FeeRate::Tier(tier) => tiers.map(|t| t.rate(tier)),
        }
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        FeeRate::Tier(FeeTier::Fastest)
    }
}

/// Estimate the virtual size of a transaction.
///
/// `ceil(10.5 + num_inputs * 57.25 + num_outputs * 43)`, computed in
/// quarter-vbytes so the ceiling is exact. The same figure is used for every
/// script type; legacy spends are underestimated.
pub fn estimate_virtual_size(num_inputs: usize, num_outputs: usize) -> u64 {
    let quarters = TX_OVERHEAD_QUARTER_VBYTES
        + num_inputs as u64 * INPUT_QUARTER_VBYTES
        + num_outputs as u64 * OUTPUT_QUARTER_VBYTES;
    quarters.div_ceil(4)
}

/// Fee owed for the estimated size at `fee_rate_sat_vbyte`.
pub fn estimate_fee(num_inputs: usize, num_outputs: usize, fee_rate_sat_vbyte: u64) -> u64 {
    estimate_virtual_size(num_inputs, num_outputs) * fee_rate_sat_vbyte
}
