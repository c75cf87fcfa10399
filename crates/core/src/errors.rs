//! Error taxonomy
//!
//! Transport failures are retryable by the caller; contract failures are
//! deterministic and never retried automatically; validation failures are
//! caller errors surfaced immediately.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport-layer failures (retryable with backoff)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("node unreachable: {0}")]
    Unreachable(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Contract-level failures (deterministic, not retried)
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractError {
    #[error("contract trapped: {0}")]
    Trapped(String),

    #[error("resource limit exceeded: used {used} of {limit}")]
    ResourceExceeded { used: u64, limit: u64 },
}

/// Caller errors, surfaced immediately
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown contract: {0}")]
    UnknownContract(String),

    #[error("contract {name} already registered at {existing}, refusing {attempted}")]
    NameCollision {
        name: String,
        existing: Address,
        attempted: Address,
    },

    #[error("contract {contract} has no entry point {entry_point}")]
    UnknownEntryPoint {
        contract: String,
        entry_point: String,
    },

    #[error("quote {sequence} expired")]
    QuoteExpired { sequence: u64 },

    #[error("quote {sequence} already used for an execution attempt")]
    QuoteAlreadyUsed { sequence: u64 },

    #[error("malformed call: {0}")]
    MalformedCall(String),

    #[error("orchestration plan has no steps")]
    EmptyPlan,
}

/// Failure of a submission channel, split so the protected-path fallback
/// decision can distinguish what is worth retrying elsewhere
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Top-level engine error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("signing failed: {0}")]
    Signing(String),
}

impl From<ChannelError> for EngineError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Transport(e) => EngineError::Transport(e),
            ChannelError::Contract(e) => EngineError::Contract(e),
        }
    }
}

/// Result type aliases
pub type EngineResult<T> = Result<T, EngineError>;
pub type TransportResult<T> = Result<T, TransportError>;
