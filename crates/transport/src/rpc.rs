//! JSON-RPC transport over HTTP
//!
//! One pooled `reqwest` client is the shared connection pool; every call
//! is wrapped in a bounded timeout so a stuck node reads as a transport
//! failure, never an indefinite hang.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use engine_core::{
    CallSpec, ChannelError, ContractError, HealthStatus, ResourceFootprint, SignedTransaction,
    TransportConfig, TransportError,
};

use crate::adapter::{RawSimulation, RpcTransport, SubmissionReceipt};

/// JSON-RPC error code the node uses for a trapped execution
const CODE_TRAPPED: i64 = -32050;
/// JSON-RPC error code for a resource-limit rejection
const CODE_RESOURCE_EXCEEDED: i64 = -32051;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireHealth {
    healthy: bool,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct WireSimulation {
    status: String,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    reason: String,
    footprint: WireFootprint,
}

#[derive(Debug, Default, Deserialize)]
struct WireFootprint {
    compute_units: u64,
    #[serde(default)]
    storage_delta: i64,
    #[serde(default)]
    limit: u64,
}

/// Production transport over JSON-RPC/HTTP
pub struct HttpRpcTransport {
    client: reqwest::Client,
    config: TransportConfig,
    next_id: AtomicU64,
}

impl HttpRpcTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            next_id: AtomicU64::new(1),
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        url: &str,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Result<T, RpcErrorBody>, TransportError> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let timeout = self.config.request_timeout();
        let send = self.client.post(url).json(&body).send();

        let response = tokio::time::timeout(timeout, send)
            .await
            .map_err(|_| TransportError::Timeout {
                ms: self.config.request_timeout_ms,
            })?
            .map_err(|e| {
                if e.is_connect() {
                    TransportError::Unreachable(e.to_string())
                } else if e.is_timeout() {
                    TransportError::Timeout {
                        ms: self.config.request_timeout_ms,
                    }
                } else {
                    TransportError::MalformedResponse(e.to_string())
                }
            })?;

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

        match (parsed.result, parsed.error) {
            (Some(result), None) => Ok(Ok(result)),
            (None, Some(error)) => Ok(Err(error)),
            _ => Err(TransportError::MalformedResponse(
                "response carried neither result nor error".to_string(),
            )),
        }
    }

    fn endpoint(&self) -> &str {
        &self.config.endpoint_url
    }

    fn relay(&self) -> Result<&str, TransportError> {
        self.config
            .relay_url
            .as_deref()
            .ok_or_else(|| TransportError::Unreachable("no protected relay configured".to_string()))
    }

    fn submission_error(error: RpcErrorBody) -> ChannelError {
        match error.code {
            CODE_TRAPPED => ChannelError::Contract(ContractError::Trapped(error.message)),
            CODE_RESOURCE_EXCEEDED => {
                let used = error.data.get("used").and_then(|v| v.as_u64()).unwrap_or(0);
                let limit = error.data.get("limit").and_then(|v| v.as_u64()).unwrap_or(0);
                ChannelError::Contract(ContractError::ResourceExceeded { used, limit })
            }
            _ => ChannelError::Transport(TransportError::MalformedResponse(format!(
                "node rejected submission: {} ({})",
                error.message, error.code
            ))),
        }
    }
}

#[async_trait::async_trait]
impl RpcTransport for HttpRpcTransport {
    async fn probe_health(&self) -> Result<HealthStatus, TransportError> {
        let result: Result<WireHealth, _> = self
            .request(self.endpoint(), "engine_health", json!([]))
            .await?;

        match result {
            Ok(health) if health.healthy => Ok(HealthStatus::Healthy),
            Ok(health) => Ok(HealthStatus::Unhealthy {
                reason: health.reason,
            }),
            Err(error) => Ok(HealthStatus::Unhealthy {
                reason: error.message,
            }),
        }
    }

    async fn simulate(&self, call: &CallSpec) -> Result<RawSimulation, TransportError> {
        debug!(
            contract = %call.contract,
            entry_point = %call.entry_point,
            "submitting simulation"
        );

        let params = json!([{
            "contract": call.address,
            "entry_point": call.entry_point,
            "params": call.params,
        }]);

        let result: Result<WireSimulation, _> = self
            .request(self.endpoint(), "engine_simulate", params)
            .await?;

        let wire = result.map_err(|e| {
            TransportError::MalformedResponse(format!("simulation rejected: {}", e.message))
        })?;

        let footprint = ResourceFootprint {
            compute_units: wire.footprint.compute_units,
            storage_delta: wire.footprint.storage_delta,
        };

        match wire.status.as_str() {
            "ok" => Ok(RawSimulation::Success {
                value: wire.value,
                footprint,
            }),
            "trapped" => Ok(RawSimulation::ContractFailure {
                error: ContractError::Trapped(wire.reason),
                footprint,
            }),
            "resource_exceeded" => Ok(RawSimulation::ContractFailure {
                error: ContractError::ResourceExceeded {
                    used: wire.footprint.compute_units,
                    limit: wire.footprint.limit,
                },
                footprint,
            }),
            other => Err(TransportError::MalformedResponse(format!(
                "unknown simulation status: {other}"
            ))),
        }
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<SubmissionReceipt, ChannelError> {
        let result: Result<SubmissionReceipt, _> = self
            .request(self.endpoint(), "engine_sendTransaction", json!([tx]))
            .await
            .map_err(ChannelError::Transport)?;

        result.map_err(Self::submission_error)
    }

    async fn submit_protected(
        &self,
        tx: &SignedTransaction,
    ) -> Result<SubmissionReceipt, ChannelError> {
        let relay = self.relay().map_err(ChannelError::Transport)?;

        let result: Result<SubmissionReceipt, _> = self
            .request(relay, "engine_sendProtectedTransaction", json!([tx]))
            .await
            .map_err(ChannelError::Transport)?;

        result.map_err(Self::submission_error)
    }
}
