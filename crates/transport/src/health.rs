//! Health probing with bounded retry
//!
//! Transports expose a single probe; the retry/backoff policy lives here
//! so every implementation gets the same behavior. A probe that keeps
//! failing is reported as unreachable, never converted into a fabricated
//! healthy state.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use engine_core::{HealthStatus, TransportConfig, TransportError};

use crate::adapter::RpcTransport;

/// Retrying wrapper around `probe_health`
pub struct HealthMonitor {
    transport: Arc<dyn RpcTransport>,
    attempts: u32,
    base_backoff: Duration,
}

impl HealthMonitor {
    pub fn new(transport: Arc<dyn RpcTransport>, config: &TransportConfig) -> Self {
        Self {
            transport,
            attempts: config.health_attempts.max(1),
            base_backoff: config.health_backoff(),
        }
    }

    /// Probe with bounded exponential backoff between transient failures
    pub async fn check(&self) -> Result<HealthStatus, TransportError> {
        let mut delay = self.base_backoff;

        for attempt in 1..=self.attempts {
            match self.transport.probe_health().await {
                Ok(status) => {
                    debug!(attempt, status = %status, "health probe resolved");
                    return Ok(status);
                }
                Err(e) if attempt < self.attempts => {
                    warn!(attempt, error = %e, "health probe failed, backing off");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "health probe exhausted retries");
                    return Err(e);
                }
            }
        }

        unreachable!("loop returns on the final attempt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    fn config(attempts: u32) -> TransportConfig {
        TransportConfig {
            health_attempts: attempts,
            health_backoff_ms: 1,
            ..TransportConfig::default()
        }
    }

    #[tokio::test]
    async fn test_recovers_within_retry_budget() {
        let mock = Arc::new(MockTransport::new());
        mock.push_health(Err(TransportError::Unreachable("refused".to_string())));
        mock.push_health(Err(TransportError::Timeout { ms: 10 }));
        mock.push_health(Ok(HealthStatus::Healthy));

        let monitor = HealthMonitor::new(mock.clone(), &config(3));
        let status = monitor.check().await.unwrap();
        assert!(status.is_healthy());
        assert_eq!(mock.health_calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_error() {
        let mock = Arc::new(MockTransport::new());
        for _ in 0..3 {
            mock.push_health(Err(TransportError::Unreachable("refused".to_string())));
        }

        let monitor = HealthMonitor::new(mock.clone(), &config(3));
        let err = monitor.check().await.unwrap_err();
        assert!(matches!(err, TransportError::Unreachable(_)));
        assert_eq!(mock.health_calls(), 3);
    }

    #[tokio::test]
    async fn test_unhealthy_is_not_retried() {
        // A node answering "unhealthy" is an answer, not a transient failure
        let mock = Arc::new(MockTransport::new());
        mock.push_health(Ok(HealthStatus::Unhealthy {
            reason: "syncing".to_string(),
        }));

        let monitor = HealthMonitor::new(mock.clone(), &config(3));
        let status = monitor.check().await.unwrap();
        assert!(!status.is_healthy());
        assert_eq!(mock.health_calls(), 1);
    }
}
