//! Gas estimation engine
//!
//! Estimates are cached by call *shape* (contract, entry point,
//! complexity signature), not by parameter values, so a burst of
//! structurally identical calls costs one simulation. Entries expire
//! after the configured staleness bound and are recomputed, never served
//! stale. An in-flight registry gives single-flight behavior under
//! concurrency: the first requester computes, concurrent waiters observe
//! the freshly populated value, and a cancelled computation leaves no
//! entry behind.

use alloy_primitives::{Address, U256};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::debug;

use engine_core::{CallSpec, ComplexitySignature, EngineError, GasConfig, GasEstimate, SizeClass};
use engine_transport::{RawSimulation, RpcTransport};

/// Fee floor per compute unit, in base currency units
pub const FEE_PER_COMPUTE_UNIT: u64 = 1_000;

/// Operation family, keyed off the entry-point name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Swap,
    AddLiquidity,
    RemoveLiquidity,
    Transfer,
    Generic,
}

impl OperationKind {
    pub fn from_entry_point(name: &str) -> Self {
        match name {
            "swap" => OperationKind::Swap,
            "add_liquidity" => OperationKind::AddLiquidity,
            "remove_liquidity" => OperationKind::RemoveLiquidity,
            "transfer" => OperationKind::Transfer,
            _ => OperationKind::Generic,
        }
    }

    /// Base compute cost before complexity scaling
    pub fn base_cost(&self) -> u64 {
        match self {
            OperationKind::Swap => 150_000,
            OperationKind::AddLiquidity => 180_000,
            OperationKind::RemoveLiquidity => 160_000,
            OperationKind::Transfer => 21_000,
            OperationKind::Generic => 90_000,
        }
    }
}

/// Cache key: everything that affects cost, nothing that does not
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GasCacheKey {
    contract: Address,
    entry_point: String,
    signature: ComplexitySignature,
}

impl GasCacheKey {
    pub fn for_call(call: &CallSpec) -> Self {
        Self {
            contract: call.address,
            entry_point: call.entry_point.clone(),
            signature: call.complexity_signature(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    estimate: GasEstimate,
    computed_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, staleness: Duration) -> bool {
        self.computed_at.elapsed() < staleness
    }
}

/// Cache readout for the observability sink
#[derive(Debug, Clone, Copy)]
pub struct GasCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// The single source of truth for cost lookups
pub struct GasEstimator {
    transport: Arc<dyn RpcTransport>,
    cache: DashMap<GasCacheKey, CacheEntry>,
    in_flight: DashMap<GasCacheKey, Arc<OnceCell<GasEstimate>>>,
    staleness: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Removes one leader's in-flight registration when its `estimate` call
/// finishes or is cancelled, so an abandoned computation does not pin an
/// empty cell in the map. Only this leader's own cell is removed; a
/// replacement registered under the same key afterwards is left alone.
struct InFlightCleanup<'a> {
    registry: &'a DashMap<GasCacheKey, Arc<OnceCell<GasEstimate>>>,
    key: &'a GasCacheKey,
    cell: &'a Arc<OnceCell<GasEstimate>>,
}

impl Drop for InFlightCleanup<'_> {
    fn drop(&mut self) {
        self.registry
            .remove_if(self.key, |_, current| Arc::ptr_eq(current, self.cell));
    }
}

impl GasEstimator {
    pub fn new(transport: Arc<dyn RpcTransport>, config: &GasConfig) -> Self {
        Self {
            transport,
            cache: DashMap::new(),
            in_flight: DashMap::new(),
            staleness: config.staleness(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Fresh cache entry for a key, if one exists.
    /// Guard is dropped before return; never held across an await.
    fn fresh_cached(&self, key: &GasCacheKey) -> Option<GasEstimate> {
        self.cache
            .get(key)
            .filter(|entry| entry.is_fresh(self.staleness))
            .map(|entry| entry.estimate)
    }

    /// Estimate the resource cost of a call
    pub async fn estimate(&self, call: &CallSpec) -> Result<GasEstimate, EngineError> {
        let key = GasCacheKey::for_call(call);

        if let Some(estimate) = self.fresh_cached(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(
                contract = %call.contract,
                entry_point = %call.entry_point,
                cache_hit = true,
                "gas estimate served from cache"
            );
            return Ok(estimate);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(
            contract = %call.contract,
            entry_point = %call.entry_point,
            cache_hit = false,
            "gas estimate requires simulation"
        );

        let cell = {
            let entry = self.in_flight.entry(key.clone()).or_default();
            Arc::clone(entry.value())
        };
        let _cleanup = InFlightCleanup {
            registry: &self.in_flight,
            key: &key,
            cell: &cell,
        };

        let result = cell
            .get_or_try_init(|| self.init_estimate(&key, call))
            .await
            .copied();

        match result {
            Ok(estimate) => {
                self.cache.insert(
                    key.clone(),
                    CacheEntry {
                        estimate,
                        computed_at: Instant::now(),
                    },
                );
                Ok(estimate)
            }
            // Nothing is cached for a failed simulation; the next
            // caller starts from a clean slate
            Err(e) => Err(e),
        }
    }

    /// Initializer run by the single-flight leader. A prior leader may
    /// have filled the cache between this caller's miss and its cell
    /// registration; that value is observed instead of simulating again.
    async fn init_estimate(
        &self,
        key: &GasCacheKey,
        call: &CallSpec,
    ) -> Result<GasEstimate, EngineError> {
        if let Some(estimate) = self.fresh_cached(key) {
            return Ok(estimate);
        }
        self.compute(call).await
    }

    async fn compute(&self, call: &CallSpec) -> Result<GasEstimate, EngineError> {
        let raw = self.transport.simulate(call).await?;

        let footprint = match raw {
            RawSimulation::Success { footprint, .. } => footprint,
            RawSimulation::ContractFailure { error, .. } => {
                return Err(EngineError::Contract(error))
            }
        };

        let signature = call.complexity_signature();
        let scaled = Self::scale_cost(
            OperationKind::from_entry_point(&call.entry_point).base_cost(),
            signature,
        );
        let compute_units = scaled.max(footprint.compute_units);

        Ok(GasEstimate {
            compute_units,
            storage_delta: footprint.storage_delta,
            fee_floor: U256::from(compute_units) * U256::from(FEE_PER_COMPUTE_UNIT),
        })
    }

    /// Scale a base cost by the call's complexity signature.
    /// Larger inputs genuinely cost more compute; the signature keeps the
    /// cache from tracking every distinct value.
    fn scale_cost(base: u64, signature: ComplexitySignature) -> u64 {
        let arity_pct = 100 + 8 * signature.param_count as u64;
        let size_pct = match signature.size_class {
            SizeClass::Small => 100,
            SizeClass::Medium => 125,
            SizeClass::Large => 160,
        };
        base * arity_pct / 100 * size_pct / 100
    }

    pub fn stats(&self) -> GasCacheStats {
        GasCacheStats {
            entries: self.cache.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
