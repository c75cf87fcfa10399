//! Deterministic transport for tests
//!
//! Interface substitution instead of mocking frameworks: the mock is a
//! real `RpcTransport` with configurable per-method responses, atomic
//! call counters, and optional per-entry-point latency so ordering and
//! concurrency behavior can be exercised deterministically.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use engine_core::{
    CallSpec, ChannelError, HealthStatus, ResourceFootprint, SignedTransaction, TransportError,
};

use crate::adapter::{RawSimulation, RpcTransport, SubmissionReceipt};

/// Build a successful simulation response
pub fn sim_success(value: serde_json::Value, compute_units: u64) -> RawSimulation {
    RawSimulation::Success {
        value,
        footprint: ResourceFootprint {
            compute_units,
            storage_delta: 0,
        },
    }
}

/// Configurable deterministic transport
pub struct MockTransport {
    health_queue: Mutex<VecDeque<Result<HealthStatus, TransportError>>>,
    simulate_queue: Mutex<VecDeque<Result<RawSimulation, TransportError>>>,
    simulate_default: RwLock<Result<RawSimulation, TransportError>>,
    simulate_by_entry: RwLock<HashMap<String, Result<RawSimulation, TransportError>>>,
    simulate_delays: RwLock<HashMap<String, Duration>>,
    submit_queue: Mutex<VecDeque<Result<SubmissionReceipt, ChannelError>>>,
    protected_queue: Mutex<VecDeque<Result<SubmissionReceipt, ChannelError>>>,
    protected_default: RwLock<Option<ChannelError>>,

    health_calls: AtomicU64,
    simulate_calls: AtomicU64,
    submit_calls: AtomicU64,
    protected_calls: AtomicU64,

    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    next_tx_id: AtomicU64,
    echo: std::sync::atomic::AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            health_queue: Mutex::new(VecDeque::new()),
            simulate_queue: Mutex::new(VecDeque::new()),
            simulate_default: RwLock::new(Ok(sim_success(serde_json::Value::Null, 21_000))),
            simulate_by_entry: RwLock::new(HashMap::new()),
            simulate_delays: RwLock::new(HashMap::new()),
            submit_queue: Mutex::new(VecDeque::new()),
            protected_queue: Mutex::new(VecDeque::new()),
            protected_default: RwLock::new(None),
            health_calls: AtomicU64::new(0),
            simulate_calls: AtomicU64::new(0),
            submit_calls: AtomicU64::new(0),
            protected_calls: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            next_tx_id: AtomicU64::new(1),
            echo: std::sync::atomic::AtomicBool::new(false),
        }
    }

    // --- configuration ---

    pub fn push_health(&self, response: Result<HealthStatus, TransportError>) {
        self.health_queue.lock().push_back(response);
    }

    /// Queue a one-shot simulation response (FIFO ahead of the default)
    pub fn push_simulation(&self, response: Result<RawSimulation, TransportError>) {
        self.simulate_queue.lock().push_back(response);
    }

    /// Response returned whenever the queue is empty
    pub fn set_simulation_default(&self, response: Result<RawSimulation, TransportError>) {
        *self.simulate_default.write() = response;
    }

    /// Fixed response for every dry run of one entry point
    /// (takes precedence over the queue and the default)
    pub fn set_simulation_for(&self, entry_point: &str, response: Result<RawSimulation, TransportError>) {
        self.simulate_by_entry
            .write()
            .insert(entry_point.to_string(), response);
    }

    /// Artificial latency for dry runs of one entry point
    pub fn set_simulate_delay(&self, entry_point: &str, delay: Duration) {
        self.simulate_delays
            .write()
            .insert(entry_point.to_string(), delay);
    }

    /// Echo mode: simulations succeed with the call's entry point as the
    /// return value, so tests can match results back to their inputs
    pub fn set_echo(&self, on: bool) {
        self.echo.store(on, Ordering::SeqCst);
    }

    pub fn push_submit(&self, response: Result<SubmissionReceipt, ChannelError>) {
        self.submit_queue.lock().push_back(response);
    }

    pub fn push_protected(&self, response: Result<SubmissionReceipt, ChannelError>) {
        self.protected_queue.lock().push_back(response);
    }

    /// Make every protected submission fail at the transport layer
    pub fn fail_protected_transport(&self) {
        *self.protected_default.write() = Some(ChannelError::Transport(
            TransportError::Unreachable("relay unreachable".to_string()),
        ));
    }

    /// Make every protected submission fail with a contract rejection
    pub fn fail_protected_contract(&self, reason: &str) {
        *self.protected_default.write() = Some(ChannelError::Contract(
            engine_core::ContractError::Trapped(reason.to_string()),
        ));
    }

    // --- observation ---

    pub fn health_calls(&self) -> u64 {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn simulate_calls(&self) -> u64 {
        self.simulate_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> u64 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn protected_calls(&self) -> u64 {
        self.protected_calls.load(Ordering::SeqCst)
    }

    /// Total submissions across both channels
    pub fn total_submissions(&self) -> u64 {
        self.submit_calls() + self.protected_calls()
    }

    /// Highest number of simulations observed in flight at once
    pub fn max_simulations_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn generated_receipt(&self) -> SubmissionReceipt {
        let id = self.next_tx_id.fetch_add(1, Ordering::SeqCst);
        SubmissionReceipt {
            tx_id: format!("0x{id:064x}"),
            gas_used: Some(21_000),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RpcTransport for MockTransport {
    async fn probe_health(&self) -> Result<HealthStatus, TransportError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.health_queue
            .lock()
            .pop_front()
            .unwrap_or(Ok(HealthStatus::Healthy))
    }

    async fn simulate(&self, call: &CallSpec) -> Result<RawSimulation, TransportError> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = self.simulate_delays.read().get(&call.entry_point).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            // Yield so concurrent callers genuinely overlap
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(fixed) = self.simulate_by_entry.read().get(&call.entry_point).cloned() {
            return fixed;
        }
        if let Some(queued) = self.simulate_queue.lock().pop_front() {
            return queued;
        }
        if self.echo.load(Ordering::SeqCst) {
            return Ok(sim_success(
                serde_json::Value::String(call.entry_point.clone()),
                21_000,
            ));
        }
        self.simulate_default.read().clone()
    }

    async fn submit(&self, _tx: &SignedTransaction) -> Result<SubmissionReceipt, ChannelError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        match self.submit_queue.lock().pop_front() {
            Some(response) => response,
            None => Ok(self.generated_receipt()),
        }
    }

    async fn submit_protected(
        &self,
        _tx: &SignedTransaction,
    ) -> Result<SubmissionReceipt, ChannelError> {
        self.protected_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(response) = self.protected_queue.lock().pop_front() {
            return response;
        }
        if let Some(failure) = self.protected_default.read().clone() {
            return Err(failure);
        }
        Ok(self.generated_receipt())
    }
}
