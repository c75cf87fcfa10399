//! Protected submission channel
//!
//! Protected path first; if that path fails at the transport layer the
//! transaction falls back to standard submission and the result records
//! which channel actually carried it. A contract-level rejection is
//! deterministic and is never retried on the fallback path.

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use engine_core::{
    now_ms, ChannelError, EngineError, ProtectedSubmissionResult, SignedTransaction,
    SubmissionConfig, SubmissionPath,
};
use engine_transport::RpcTransport;

pub struct ProtectedSubmitter {
    transport: Arc<dyn RpcTransport>,
    prefer_protected: bool,
}

impl ProtectedSubmitter {
    pub fn new(transport: Arc<dyn RpcTransport>, config: &SubmissionConfig) -> Self {
        Self {
            transport,
            prefer_protected: config.prefer_protected,
        }
    }

    /// Submit with front-running protection and standard-path fallback
    pub async fn submit_protected(
        &self,
        tx: &SignedTransaction,
    ) -> Result<ProtectedSubmissionResult, EngineError> {
        let started = Instant::now();

        if !self.prefer_protected {
            let receipt = self.transport.submit(tx).await.map_err(EngineError::from)?;
            return Ok(self.result(SubmissionPath::Fallback, receipt.tx_id, started));
        }

        match self.transport.submit_protected(tx).await {
            Ok(receipt) => Ok(self.result(SubmissionPath::Protected, receipt.tx_id, started)),
            Err(ChannelError::Transport(e)) => {
                warn!(error = %e, "protected path failed, falling back to standard submission");
                let receipt = self.transport.submit(tx).await.map_err(EngineError::from)?;
                Ok(self.result(SubmissionPath::Fallback, receipt.tx_id, started))
            }
            Err(ChannelError::Contract(e)) => {
                // Deterministic rejection; the fallback path would repeat it
                Err(EngineError::Contract(e))
            }
        }
    }

    fn result(
        &self,
        path: SubmissionPath,
        tx_id: String,
        started: Instant,
    ) -> ProtectedSubmissionResult {
        let latency_ms = started.elapsed().as_millis() as u64;
        info!(path = %path, tx_id = %tx_id, latency_ms, "transaction submitted");
        ProtectedSubmissionResult {
            path,
            tx_id,
            latency_ms,
            submitted_at_ms: now_ms(),
        }
    }
}
