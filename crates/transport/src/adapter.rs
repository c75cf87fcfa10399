//! Transport boundary trait and wire-level result types

use serde::{Deserialize, Serialize};

use engine_core::{
    CallSpec, ChannelError, ContractError, HealthStatus, ResourceFootprint, SignedTransaction,
    TransportError,
};

/// Node response to a dry run, before typed decoding
///
/// Transport failures never appear here; they surface as
/// `TransportError` so upstream components can tell what is retryable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RawSimulation {
    /// The call executed; `value` is the node's structured return encoding
    Success {
        value: serde_json::Value,
        footprint: ResourceFootprint,
    },
    /// The call reached the node but failed inside the contract
    ContractFailure {
        error: ContractError,
        footprint: ResourceFootprint,
    },
}

impl RawSimulation {
    pub fn footprint(&self) -> ResourceFootprint {
        match self {
            RawSimulation::Success { footprint, .. } => *footprint,
            RawSimulation::ContractFailure { footprint, .. } => *footprint,
        }
    }
}

/// Receipt for an accepted submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub tx_id: String,
    pub gas_used: Option<u64>,
}

/// The RPC transport capability
///
/// The engine receives an already-healthy handle; node selection and
/// failover happen on the other side of this boundary.
#[async_trait::async_trait]
pub trait RpcTransport: Send + Sync {
    /// Single probe, no retries; retry policy lives in `HealthMonitor`
    async fn probe_health(&self) -> Result<HealthStatus, TransportError>;

    /// Dry-run a call against current ledger state
    async fn simulate(&self, call: &CallSpec) -> Result<RawSimulation, TransportError>;

    /// Submit through the standard channel
    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmissionReceipt, ChannelError>;

    /// Submit through the front-running-resistant channel
    async fn submit_protected(
        &self,
        tx: &SignedTransaction,
    ) -> Result<SubmissionReceipt, ChannelError>;
}
