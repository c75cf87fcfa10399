//! Core type definitions

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An asset identified by its on-chain address, with an amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
    pub asset: Address,
    pub amount: U256,
}

impl AssetAmount {
    pub fn new(asset: Address, amount: U256) -> Self {
        Self { asset, amount }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

/// Node health as reported by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Unhealthy { reason: String },
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy { reason } => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// Resource footprint observed during a dry run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFootprint {
    pub compute_units: u64,
    pub storage_delta: i64,
}

/// Resource-cost estimate for a call shape
///
/// Derived from an operation-specific base cost scaled by the call's
/// complexity signature, floored at the footprint observed in simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimate {
    pub compute_units: u64,
    pub storage_delta: i64,
    pub fee_floor: U256,
}

/// Transaction ready for signing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: u64,
    pub max_fee_per_unit: U256,
    pub priority_fee_per_unit: U256,
}

/// Signed transaction as produced by the signing capability
///
/// The engine never sees key material; this is opaque past the signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub unsigned: UnsignedTransaction,
    pub signature: Bytes,
}

/// Which channel actually carried a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionPath {
    Protected,
    Fallback,
}

impl fmt::Display for SubmissionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionPath::Protected => write!(f, "protected"),
            SubmissionPath::Fallback => write!(f, "fallback"),
        }
    }
}

/// Result of a protected submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedSubmissionResult {
    pub path: SubmissionPath,
    pub tx_id: String,
    pub latency_ms: u64,
    pub submitted_at_ms: u64,
}

/// Wall-clock now in milliseconds
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}
