//! Swap and liquidity quote types
//!
//! Quotes are immutable once issued: a new quote is a new object with a
//! fresh sequence number. Expiry is tracked on the monotonic clock so a
//! wall-clock adjustment can never extend a quote's validity.

use alloy_primitives::{Address, U256};
use std::time::{Duration, Instant};

use crate::calls::CallSpec;
use crate::types::{AssetAmount, GasEstimate};

/// Time-bounded priced offer to execute a swap
#[derive(Debug, Clone)]
pub struct SwapQuote {
    pub sequence: u64,
    pub input_asset: Address,
    pub input_amount: U256,
    pub output_asset: Address,
    pub expected_output: U256,
    pub price_impact_bps: u32,
    pub gas: GasEstimate,
    /// The exact call this quote prices; execution replays it unchanged
    pub call: CallSpec,
    pub issued_at: Instant,
    pub expires_at: Instant,
    pub issued_at_ms: u64,
}

impl SwapQuote {
    /// Expired at or after the expiry instant, never strictly before
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn remaining_validity(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

/// Direction of a liquidity operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidityDirection {
    Add,
    Remove,
}

/// Time-bounded priced offer to add or remove pool liquidity
#[derive(Debug, Clone)]
pub struct LiquidityQuote {
    pub sequence: u64,
    pub pool: Address,
    pub direction: LiquidityDirection,
    pub inputs: Vec<AssetAmount>,
    pub expected_outputs: Vec<AssetAmount>,
    pub price_impact_bps: u32,
    pub gas: GasEstimate,
    pub call: CallSpec,
    pub issued_at: Instant,
    pub expires_at: Instant,
    pub issued_at_ms: u64,
}

impl LiquidityQuote {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
