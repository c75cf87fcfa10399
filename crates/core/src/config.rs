//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub endpoint_url: String,
    /// Front-running-resistant relay; absent means protected submission
    /// is unavailable and everything goes through the standard path
    pub relay_url: Option<String>,
    pub request_timeout_ms: u64,
    pub health_attempts: u32,
    pub health_backoff_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            relay_url: None,
            request_timeout_ms: 5_000,
            health_attempts: 3,
            health_backoff_ms: 200,
        }
    }
}

impl TransportConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn health_backoff(&self) -> Duration {
        Duration::from_millis(self.health_backoff_ms)
    }
}

/// Gas estimation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasConfig {
    /// Entries older than this are recomputed, never served
    pub staleness_ms: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self { staleness_ms: 30_000 }
    }
}

impl GasConfig {
    pub fn staleness(&self) -> Duration {
        Duration::from_millis(self.staleness_ms)
    }
}

/// Quote issuance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// Short on purpose: on-chain state moves under the quote
    pub validity_ms: u64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self { validity_ms: 5_000 }
    }
}

impl QuoteConfig {
    pub fn validity(&self) -> Duration {
        Duration::from_millis(self.validity_ms)
    }
}

/// Simulation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Upper bound on dry runs in flight against the node
    pub max_in_flight: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { max_in_flight: 8 }
    }
}

/// Submission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    pub prefer_protected: bool,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            prefer_protected: true,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub transport: TransportConfig,
    pub gas: GasConfig,
    pub quotes: QuoteConfig,
    pub simulation: SimulationConfig,
    pub submission: SubmissionConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_bounded() {
        let config = EngineConfig::default();
        assert!(config.transport.request_timeout_ms > 0);
        assert_eq!(config.transport.health_attempts, 3);
        assert!(config.quotes.validity_ms <= 10_000, "quotes must be short-lived");
        assert!(config.simulation.max_in_flight > 0);
    }
}
