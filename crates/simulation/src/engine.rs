//! Simulation engine
//!
//! Executes dry runs against the node, one or many at a time. Concurrency
//! is bounded by a semaphore shared across all callers so bursts cannot
//! overwhelm the node; `simulate_many` preserves caller ordering in its
//! results regardless of completion order.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::debug;

use engine_core::{
    CallSpec, ContractError, EngineError, ResourceFootprint, SimulationConfig, TransportError,
};
use engine_transport::{RawSimulation, RpcTransport};

use crate::decode::{decode_value, DecodedValue};

/// Why a dry run did not produce a value
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SimulationFailure {
    #[error("contract trapped: {0}")]
    Trapped(String),

    #[error("resource limit exceeded: used {used} of {limit}")]
    ResourceExceeded { used: u64, limit: u64 },

    #[error("node unreachable: {0}")]
    NodeUnreachable(TransportError),

    #[error("undecodable return value: {0}")]
    DecodeFailed(String),
}

impl From<SimulationFailure> for EngineError {
    fn from(failure: SimulationFailure) -> Self {
        match failure {
            SimulationFailure::Trapped(reason) => {
                EngineError::Contract(ContractError::Trapped(reason))
            }
            SimulationFailure::ResourceExceeded { used, limit } => {
                EngineError::Contract(ContractError::ResourceExceeded { used, limit })
            }
            SimulationFailure::NodeUnreachable(e) => EngineError::Transport(e),
            SimulationFailure::DecodeFailed(reason) => {
                EngineError::Transport(TransportError::MalformedResponse(reason))
            }
        }
    }
}

/// Outcome of one dry run; consumed immediately, never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationOutcome {
    Success {
        value: DecodedValue,
        footprint: ResourceFootprint,
    },
    Failure(SimulationFailure),
}

impl SimulationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SimulationOutcome::Success { .. })
    }

    pub fn failure(&self) -> Option<&SimulationFailure> {
        match self {
            SimulationOutcome::Failure(f) => Some(f),
            _ => None,
        }
    }

    /// Short tag for the observability sink
    pub fn kind(&self) -> &'static str {
        match self {
            SimulationOutcome::Success { .. } => "success",
            SimulationOutcome::Failure(SimulationFailure::Trapped(_)) => "trapped",
            SimulationOutcome::Failure(SimulationFailure::ResourceExceeded { .. }) => {
                "resource_exceeded"
            }
            SimulationOutcome::Failure(SimulationFailure::NodeUnreachable(_)) => "unreachable",
            SimulationOutcome::Failure(SimulationFailure::DecodeFailed(_)) => "decode_failed",
        }
    }
}

/// Concurrent dry-run executor
pub struct SimulationEngine {
    transport: Arc<dyn RpcTransport>,
    limit: Arc<Semaphore>,
}

impl SimulationEngine {
    pub fn new(transport: Arc<dyn RpcTransport>, config: &SimulationConfig) -> Self {
        Self {
            transport,
            limit: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
        }
    }

    /// Dry-run a single call
    pub async fn simulate_one(&self, call: &CallSpec) -> SimulationOutcome {
        let _permit = match self.limit.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return SimulationOutcome::Failure(SimulationFailure::NodeUnreachable(
                    TransportError::Unreachable("simulation limiter closed".to_string()),
                ))
            }
        };

        let outcome = match self.transport.simulate(call).await {
            Ok(RawSimulation::Success { value, footprint }) => match decode_value(&value) {
                Ok(decoded) => SimulationOutcome::Success {
                    value: decoded,
                    footprint,
                },
                Err(reason) => SimulationOutcome::Failure(SimulationFailure::DecodeFailed(reason)),
            },
            Ok(RawSimulation::ContractFailure { error, .. }) => match error {
                ContractError::Trapped(reason) => {
                    SimulationOutcome::Failure(SimulationFailure::Trapped(reason))
                }
                ContractError::ResourceExceeded { used, limit } => {
                    SimulationOutcome::Failure(SimulationFailure::ResourceExceeded { used, limit })
                }
            },
            Err(e) => SimulationOutcome::Failure(SimulationFailure::NodeUnreachable(e)),
        };

        debug!(
            contract = %call.contract,
            entry_point = %call.entry_point,
            outcome = outcome.kind(),
            "simulation resolved"
        );
        outcome
    }

    /// Dry-run many calls concurrently; results are in input order
    pub async fn simulate_many(&self, calls: &[CallSpec]) -> Vec<SimulationOutcome> {
        let futures = calls.iter().map(|call| self.simulate_one(call));
        futures::future::join_all(futures).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use engine_transport::mock::{sim_success, MockTransport};
    use serde_json::json;
    use std::time::Duration;

    fn call(entry_point: &str) -> CallSpec {
        CallSpec::raw("pool", Address::repeat_byte(1), entry_point, vec![])
    }

    fn engine(mock: &Arc<MockTransport>, max_in_flight: usize) -> SimulationEngine {
        SimulationEngine::new(
            Arc::clone(mock) as Arc<dyn RpcTransport>,
            &SimulationConfig { max_in_flight },
        )
    }

    #[tokio::test]
    async fn test_simulate_one_success() {
        let mock = Arc::new(MockTransport::new());
        mock.push_simulation(Ok(sim_success(json!({"type": "u256", "value": "77"}), 42_000)));

        let outcome = engine(&mock, 4).simulate_one(&call("swap")).await;
        match outcome {
            SimulationOutcome::Success { value, footprint } => {
                assert_eq!(value.as_u256(), Some(alloy_primitives::U256::from(77)));
                assert_eq!(footprint.compute_units, 42_000);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_reasons_are_distinguished() {
        let mock = Arc::new(MockTransport::new());
        let engine = engine(&mock, 4);

        mock.push_simulation(Ok(RawSimulation::ContractFailure {
            error: ContractError::Trapped("division by zero".to_string()),
            footprint: ResourceFootprint::default(),
        }));
        assert_eq!(engine.simulate_one(&call("swap")).await.kind(), "trapped");

        mock.push_simulation(Ok(RawSimulation::ContractFailure {
            error: ContractError::ResourceExceeded { used: 9, limit: 5 },
            footprint: ResourceFootprint::default(),
        }));
        assert_eq!(
            engine.simulate_one(&call("swap")).await.kind(),
            "resource_exceeded"
        );

        mock.push_simulation(Err(TransportError::Timeout { ms: 10 }));
        assert_eq!(
            engine.simulate_one(&call("swap")).await.kind(),
            "unreachable"
        );

        mock.push_simulation(Ok(sim_success(json!({"type": "mystery"}), 1)));
        assert_eq!(
            engine.simulate_one(&call("swap")).await.kind(),
            "decode_failed"
        );
    }

    #[tokio::test]
    async fn test_simulate_many_preserves_input_order() {
        let mock = Arc::new(MockTransport::new());
        mock.set_echo(true);
        // First input is the slowest; completion order inverts input order
        mock.set_simulate_delay("alpha", Duration::from_millis(50));
        mock.set_simulate_delay("beta", Duration::from_millis(20));
        mock.set_simulate_delay("gamma", Duration::from_millis(1));

        let calls = vec![call("alpha"), call("beta"), call("gamma")];
        let outcomes = engine(&mock, 4).simulate_many(&calls).await;

        let names: Vec<String> = outcomes
            .iter()
            .map(|o| match o {
                SimulationOutcome::Success {
                    value: DecodedValue::Text(name),
                    ..
                } => name.clone(),
                other => panic!("expected echoed text, got {other:?}"),
            })
            .collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn test_in_flight_bound_is_respected() {
        let mock = Arc::new(MockTransport::new());
        mock.set_echo(true);
        mock.set_simulate_delay("work", Duration::from_millis(10));

        let calls: Vec<CallSpec> = (0..24).map(|_| call("work")).collect();
        let outcomes = engine(&mock, 4).simulate_many(&calls).await;

        assert_eq!(outcomes.len(), 24);
        assert!(outcomes.iter().all(SimulationOutcome::is_success));
        assert!(
            mock.max_simulations_in_flight() <= 4,
            "bound exceeded: {}",
            mock.max_simulations_in_flight()
        );
        assert!(
            mock.max_simulations_in_flight() >= 2,
            "simulations never overlapped"
        );
    }
}
