//! AMM swap and liquidity engine
//!
//! Quote-then-execute: a quote prices one exact call via simulation and
//! stays valid for a short window; executing it replays that call through
//! the protected submission channel. Quotes are single-use: once an
//! execution is attempted, success or failure, the sequence number is
//! consumed. Quoting is stateless per request and never coalesced,
//! because slippage depends on precise amounts.

use alloy_primitives::{Address, U256};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use engine_core::{
    now_ms, AssetAmount, CallSpec, ContractRegistry, EngineError, EngineResult, GasEstimate,
    LiquidityDirection, LiquidityQuote, ParamValue, ProtectedSubmissionResult, QuoteConfig,
    SwapQuote, TransportError, ValidationError,
};
use engine_simulation::{DecodedValue, GasEstimator, SimulationEngine, SimulationOutcome};

use crate::builder::TransactionBuilder;
use crate::signer::Signer;
use crate::submitter::ProtectedSubmitter;

pub struct AmmEngine {
    registry: Arc<ContractRegistry>,
    simulation: Arc<SimulationEngine>,
    gas: Arc<GasEstimator>,
    submitter: Arc<ProtectedSubmitter>,
    signer: Arc<dyn Signer>,
    builder: TransactionBuilder,
    validity: Duration,
    sequence: AtomicU64,
    used_quotes: DashMap<u64, Instant>,
}

impl AmmEngine {
    pub fn new(
        registry: Arc<ContractRegistry>,
        simulation: Arc<SimulationEngine>,
        gas: Arc<GasEstimator>,
        submitter: Arc<ProtectedSubmitter>,
        signer: Arc<dyn Signer>,
        config: &QuoteConfig,
    ) -> Self {
        Self {
            registry,
            simulation,
            gas,
            submitter,
            signer,
            builder: TransactionBuilder::new(),
            validity: config.validity(),
            sequence: AtomicU64::new(0),
            used_quotes: DashMap::new(),
        }
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Run the dry run a quote is priced from and decode its return value
    async fn priced_simulation(&self, call: &CallSpec) -> EngineResult<DecodedValue> {
        match self.simulation.simulate_one(call).await {
            SimulationOutcome::Success { value, .. } => Ok(value),
            SimulationOutcome::Failure(failure) => Err(failure.into()),
        }
    }

    fn shape_error(entry_point: &str) -> EngineError {
        EngineError::Transport(TransportError::MalformedResponse(format!(
            "unexpected {entry_point} return shape"
        )))
    }

    /// Quote a swap of `input_amount` of `input_asset` into `output_asset`
    pub async fn quote_swap(
        &self,
        pool: &str,
        input_asset: Address,
        input_amount: U256,
        output_asset: Address,
    ) -> EngineResult<SwapQuote> {
        if input_amount.is_zero() {
            return Err(ValidationError::MalformedCall("zero input amount".to_string()).into());
        }

        let descriptor = self.registry.resolve(pool)?;
        let call = CallSpec::new(
            &descriptor,
            "swap",
            vec![
                ParamValue::Address(input_asset),
                ParamValue::Unsigned(input_amount),
                ParamValue::Address(output_asset),
            ],
        )?;

        let value = self.priced_simulation(&call).await?;
        let expected_output = value
            .tuple_u256(0)
            .ok_or_else(|| Self::shape_error("swap"))?;
        let price_impact_bps = value
            .tuple_u256(1)
            .ok_or_else(|| Self::shape_error("swap"))?
            .try_into()
            .unwrap_or(u32::MAX);

        let gas = self.gas.estimate(&call).await?;

        let now = Instant::now();
        let quote = SwapQuote {
            sequence: self.next_sequence(),
            input_asset,
            input_amount,
            output_asset,
            expected_output,
            price_impact_bps,
            gas,
            call,
            issued_at: now,
            expires_at: now + self.validity,
            issued_at_ms: now_ms(),
        };

        info!(
            sequence = quote.sequence,
            pool = %pool,
            expected_output = %quote.expected_output,
            price_impact_bps = quote.price_impact_bps,
            validity_ms = self.validity.as_millis() as u64,
            "swap quote issued"
        );
        Ok(quote)
    }

    /// Consume a quote's sequence number; a second attempt is rejected.
    /// Entries whose quote has passed its validity window are pruned
    /// here, since the expiry check alone rejects those from then on.
    fn claim_quote(&self, sequence: u64, expires_at: Instant) -> Result<(), ValidationError> {
        let now = Instant::now();
        if now >= expires_at {
            return Err(ValidationError::QuoteExpired { sequence });
        }
        self.used_quotes.retain(|_, deadline| now < *deadline);
        if self.used_quotes.insert(sequence, expires_at).is_some() {
            return Err(ValidationError::QuoteAlreadyUsed { sequence });
        }
        Ok(())
    }

    async fn execute_call(
        &self,
        call: &CallSpec,
        gas: &GasEstimate,
    ) -> EngineResult<ProtectedSubmissionResult> {
        let unsigned = self.builder.build(call, gas);
        let signed = self.signer.sign(&unsigned).await?;
        self.submitter.submit_protected(&signed).await
    }

    /// Execute an accepted swap quote, strictly before its expiry
    pub async fn execute_swap(
        &self,
        quote: &SwapQuote,
    ) -> EngineResult<ProtectedSubmissionResult> {
        self.claim_quote(quote.sequence, quote.expires_at)?;
        let result = self.execute_call(&quote.call, &quote.gas).await?;
        info!(
            sequence = quote.sequence,
            path = %result.path,
            tx_id = %result.tx_id,
            "swap executed"
        );
        Ok(result)
    }

    /// Quote adding liquidity to a pool
    pub async fn quote_add_liquidity(
        &self,
        pool: &str,
        deposits: &[AssetAmount],
    ) -> EngineResult<LiquidityQuote> {
        if deposits.is_empty() || deposits.iter().any(AssetAmount::is_zero) {
            return Err(
                ValidationError::MalformedCall("liquidity deposits must be non-zero".to_string())
                    .into(),
            );
        }

        let descriptor = self.registry.resolve(pool)?;
        let mut params = Vec::with_capacity(deposits.len() * 2);
        for deposit in deposits {
            params.push(ParamValue::Address(deposit.asset));
            params.push(ParamValue::Unsigned(deposit.amount));
        }
        let call = CallSpec::new(&descriptor, "add_liquidity", params)?;

        let value = self.priced_simulation(&call).await?;
        let lp_units = value
            .tuple_u256(0)
            .ok_or_else(|| Self::shape_error("add_liquidity"))?;
        let price_impact_bps = value
            .tuple_u256(1)
            .ok_or_else(|| Self::shape_error("add_liquidity"))?
            .try_into()
            .unwrap_or(u32::MAX);

        let gas = self.gas.estimate(&call).await?;
        let now = Instant::now();
        let quote = LiquidityQuote {
            sequence: self.next_sequence(),
            pool: descriptor.address,
            direction: LiquidityDirection::Add,
            inputs: deposits.to_vec(),
            expected_outputs: vec![AssetAmount::new(descriptor.address, lp_units)],
            price_impact_bps,
            gas,
            call,
            issued_at: now,
            expires_at: now + self.validity,
            issued_at_ms: now_ms(),
        };

        info!(
            sequence = quote.sequence,
            pool = %pool,
            lp_units = %lp_units,
            "add-liquidity quote issued"
        );
        Ok(quote)
    }

    /// Quote removing liquidity; the node reports the assets paid out
    pub async fn quote_remove_liquidity(
        &self,
        pool: &str,
        lp_units: U256,
    ) -> EngineResult<LiquidityQuote> {
        if lp_units.is_zero() {
            return Err(ValidationError::MalformedCall("zero liquidity units".to_string()).into());
        }

        let descriptor = self.registry.resolve(pool)?;
        let call = CallSpec::new(
            &descriptor,
            "remove_liquidity",
            vec![ParamValue::Unsigned(lp_units)],
        )?;

        let value = self.priced_simulation(&call).await?;
        let outputs = Self::decode_payouts(&value)
            .ok_or_else(|| Self::shape_error("remove_liquidity"))?;

        let gas = self.gas.estimate(&call).await?;
        let now = Instant::now();
        let quote = LiquidityQuote {
            sequence: self.next_sequence(),
            pool: descriptor.address,
            direction: LiquidityDirection::Remove,
            inputs: vec![AssetAmount::new(descriptor.address, lp_units)],
            expected_outputs: outputs,
            price_impact_bps: 0,
            gas,
            call,
            issued_at: now,
            expires_at: now + self.validity,
            issued_at_ms: now_ms(),
        };

        info!(
            sequence = quote.sequence,
            pool = %pool,
            payouts = quote.expected_outputs.len(),
            "remove-liquidity quote issued"
        );
        Ok(quote)
    }

    /// Payouts arrive as a tuple of (address, amount) pairs
    fn decode_payouts(value: &DecodedValue) -> Option<Vec<AssetAmount>> {
        let pairs = value.as_tuple()?;
        let mut outputs = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let fields = pair.as_tuple()?;
            let asset = fields.first()?.as_address()?;
            let amount = fields.get(1)?.as_u256()?;
            outputs.push(AssetAmount::new(asset, amount));
        }
        Some(outputs)
    }

    /// Execute an accepted liquidity quote (add or remove)
    pub async fn execute_liquidity(
        &self,
        quote: &LiquidityQuote,
    ) -> EngineResult<ProtectedSubmissionResult> {
        self.claim_quote(quote.sequence, quote.expires_at)?;
        let result = self.execute_call(&quote.call, &quote.gas).await?;
        info!(
            sequence = quote.sequence,
            path = %result.path,
            tx_id = %result.tx_id,
            "liquidity operation executed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{
        ContractError, EntryPointMeta, GasConfig, InterfaceMeta, ParamKind, SimulationConfig,
        SubmissionConfig, SubmissionPath,
    };
    use engine_transport::mock::{sim_success, MockTransport};
    use engine_transport::{RawSimulation, RpcTransport};
    use serde_json::json;

    use crate::signer::StaticSigner;

    fn pool_interface() -> InterfaceMeta {
        InterfaceMeta::new(vec![
            EntryPointMeta::new(
                "swap",
                vec![ParamKind::Address, ParamKind::Unsigned, ParamKind::Address],
            ),
            EntryPointMeta::new("add_liquidity", vec![]),
            EntryPointMeta::new("remove_liquidity", vec![ParamKind::Unsigned]),
        ])
    }

    fn engine_with_validity(mock: &Arc<MockTransport>, validity_ms: u64) -> AmmEngine {
        let registry = Arc::new(ContractRegistry::new());
        registry
            .register("pool1", Address::repeat_byte(0x11), pool_interface())
            .unwrap();

        let transport = Arc::clone(mock) as Arc<dyn RpcTransport>;
        AmmEngine::new(
            registry,
            Arc::new(SimulationEngine::new(
                Arc::clone(&transport),
                &SimulationConfig::default(),
            )),
            Arc::new(GasEstimator::new(
                Arc::clone(&transport),
                &GasConfig::default(),
            )),
            Arc::new(ProtectedSubmitter::new(
                transport,
                &SubmissionConfig::default(),
            )),
            Arc::new(StaticSigner::new(1)),
            &QuoteConfig { validity_ms },
        )
    }

    fn engine(mock: &Arc<MockTransport>) -> AmmEngine {
        engine_with_validity(mock, 5_000)
    }

    fn swap_response(amount_out: u64, impact_bps: u64) -> RawSimulation {
        sim_success(
            json!([
                {"type": "u256", "value": amount_out.to_string()},
                {"type": "u256", "value": impact_bps.to_string()},
            ]),
            150_000,
        )
    }

    #[tokio::test]
    async fn test_quote_swap_scenario() {
        let mock = Arc::new(MockTransport::new());
        mock.set_simulation_for("swap", Ok(swap_response(9_900, 12)));
        let engine = engine(&mock);

        let quote = engine
            .quote_swap(
                "pool1",
                Address::repeat_byte(0xa1),
                U256::from(100),
                Address::repeat_byte(0xb2),
            )
            .await
            .unwrap();

        assert_eq!(quote.input_amount, U256::from(100));
        assert_eq!(quote.expected_output, U256::from(9_900));
        assert_eq!(quote.price_impact_bps, 12);
        assert!(!quote.is_expired(Instant::now()));
    }

    #[tokio::test]
    async fn test_sequences_are_monotonic() {
        let mock = Arc::new(MockTransport::new());
        mock.set_simulation_for("swap", Ok(swap_response(500, 3)));
        let engine = engine(&mock);

        let a = engine
            .quote_swap(
                "pool1",
                Address::repeat_byte(1),
                U256::from(10),
                Address::repeat_byte(2),
            )
            .await
            .unwrap();
        let b = engine
            .quote_swap(
                "pool1",
                Address::repeat_byte(1),
                U256::from(20),
                Address::repeat_byte(2),
            )
            .await
            .unwrap();
        assert!(b.sequence > a.sequence);
    }

    #[tokio::test]
    async fn test_execute_falls_back_when_protected_path_down() {
        let mock = Arc::new(MockTransport::new());
        mock.set_simulation_for("swap", Ok(swap_response(9_900, 12)));
        mock.fail_protected_transport();
        let engine = engine(&mock);

        let quote = engine
            .quote_swap(
                "pool1",
                Address::repeat_byte(0xa1),
                U256::from(100),
                Address::repeat_byte(0xb2),
            )
            .await
            .unwrap();

        let result = engine.execute_swap(&quote).await.unwrap();
        assert_eq!(result.path, SubmissionPath::Fallback);
    }

    #[tokio::test]
    async fn test_expired_quote_is_rejected() {
        let mock = Arc::new(MockTransport::new());
        mock.set_simulation_for("swap", Ok(swap_response(9_900, 12)));
        let engine = engine_with_validity(&mock, 0);

        let quote = engine
            .quote_swap(
                "pool1",
                Address::repeat_byte(1),
                U256::from(100),
                Address::repeat_byte(2),
            )
            .await
            .unwrap();

        let err = engine.execute_swap(&quote).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::QuoteExpired { .. })
        ));
        assert_eq!(mock.total_submissions(), 0);
    }

    #[tokio::test]
    async fn test_quote_is_single_use() {
        let mock = Arc::new(MockTransport::new());
        mock.set_simulation_for("swap", Ok(swap_response(9_900, 12)));
        let engine = engine(&mock);

        let quote = engine
            .quote_swap(
                "pool1",
                Address::repeat_byte(1),
                U256::from(100),
                Address::repeat_byte(2),
            )
            .await
            .unwrap();

        engine.execute_swap(&quote).await.unwrap();
        let err = engine.execute_swap(&quote).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::QuoteAlreadyUsed { .. })
        ));
    }

    #[tokio::test]
    async fn test_used_quotes_are_pruned_after_expiry() {
        let mock = Arc::new(MockTransport::new());
        mock.set_simulation_for("swap", Ok(swap_response(9_900, 12)));
        let engine = engine_with_validity(&mock, 30);

        let first = engine
            .quote_swap(
                "pool1",
                Address::repeat_byte(1),
                U256::from(100),
                Address::repeat_byte(2),
            )
            .await
            .unwrap();
        engine.execute_swap(&first).await.unwrap();
        assert_eq!(engine.used_quotes.len(), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;

        let second = engine
            .quote_swap(
                "pool1",
                Address::repeat_byte(1),
                U256::from(100),
                Address::repeat_byte(2),
            )
            .await
            .unwrap();
        engine.execute_swap(&second).await.unwrap();

        // The first sequence is past its validity window; expiry alone
        // rejects it now, so its entry must be gone
        assert_eq!(engine.used_quotes.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_execution_still_consumes_quote() {
        let mock = Arc::new(MockTransport::new());
        mock.set_simulation_for("swap", Ok(swap_response(9_900, 12)));
        mock.fail_protected_contract("slippage check failed");
        let engine = engine(&mock);

        let quote = engine
            .quote_swap(
                "pool1",
                Address::repeat_byte(1),
                U256::from(100),
                Address::repeat_byte(2),
            )
            .await
            .unwrap();

        let first = engine.execute_swap(&quote).await.unwrap_err();
        assert!(matches!(first, EngineError::Contract(_)));

        let second = engine.execute_swap(&quote).await.unwrap_err();
        assert!(matches!(
            second,
            EngineError::Validation(ValidationError::QuoteAlreadyUsed { .. })
        ));
    }

    #[tokio::test]
    async fn test_quote_against_trapping_pool() {
        let mock = Arc::new(MockTransport::new());
        mock.set_simulation_for(
            "swap",
            Ok(RawSimulation::ContractFailure {
                error: ContractError::Trapped("empty reserves".to_string()),
                footprint: Default::default(),
            }),
        );
        let engine = engine(&mock);

        let err = engine
            .quote_swap(
                "pool1",
                Address::repeat_byte(1),
                U256::from(100),
                Address::repeat_byte(2),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Contract(_)));
    }

    #[tokio::test]
    async fn test_unknown_pool() {
        let mock = Arc::new(MockTransport::new());
        let engine = engine(&mock);

        let err = engine
            .quote_swap(
                "nope",
                Address::repeat_byte(1),
                U256::from(100),
                Address::repeat_byte(2),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::UnknownContract(_))
        ));
    }

    #[tokio::test]
    async fn test_add_liquidity_quote_and_execute() {
        let mock = Arc::new(MockTransport::new());
        mock.set_simulation_for(
            "add_liquidity",
            Ok(sim_success(
                json!([
                    {"type": "u256", "value": "5000"},
                    {"type": "u256", "value": "4"},
                ]),
                180_000,
            )),
        );
        let engine = engine(&mock);

        let deposits = vec![
            AssetAmount::new(Address::repeat_byte(1), U256::from(100)),
            AssetAmount::new(Address::repeat_byte(2), U256::from(200)),
        ];
        let quote = engine
            .quote_add_liquidity("pool1", &deposits)
            .await
            .unwrap();

        assert_eq!(quote.direction, LiquidityDirection::Add);
        assert_eq!(quote.expected_outputs[0].amount, U256::from(5_000));
        assert_eq!(quote.price_impact_bps, 4);

        let result = engine.execute_liquidity(&quote).await.unwrap();
        assert_eq!(result.path, SubmissionPath::Protected);
    }

    #[tokio::test]
    async fn test_remove_liquidity_decodes_payouts() {
        let mock = Arc::new(MockTransport::new());
        let asset_a = Address::repeat_byte(0x0a);
        let asset_b = Address::repeat_byte(0x0b);
        mock.set_simulation_for(
            "remove_liquidity",
            Ok(sim_success(
                json!([
                    [
                        {"type": "address", "value": format!("{asset_a}")},
                        {"type": "u256", "value": "70"},
                    ],
                    [
                        {"type": "address", "value": format!("{asset_b}")},
                        {"type": "u256", "value": "30"},
                    ],
                ]),
                160_000,
            )),
        );
        let engine = engine(&mock);

        let quote = engine
            .quote_remove_liquidity("pool1", U256::from(50))
            .await
            .unwrap();

        assert_eq!(quote.direction, LiquidityDirection::Remove);
        assert_eq!(
            quote.expected_outputs,
            vec![
                AssetAmount::new(asset_a, U256::from(70)),
                AssetAmount::new(asset_b, U256::from(30)),
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_amount_is_caller_error() {
        let mock = Arc::new(MockTransport::new());
        let engine = engine(&mock);

        let err = engine
            .quote_swap(
                "pool1",
                Address::repeat_byte(1),
                U256::ZERO,
                Address::repeat_byte(2),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::MalformedCall(_))
        ));
        assert_eq!(mock.simulate_calls(), 0);
    }
}
