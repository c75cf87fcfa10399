//! Cross-contract orchestration
//!
//! Runs an ordered sequence of calls for which all-or-nothing is the
//! goal and pre-flight simulation is the enforcement point: nothing is
//! submitted until every step has dry-run cleanly in plan order. Live
//! submission then proceeds sequentially. There is no on-chain rollback,
//! so a live failure after earlier commits surfaces as partial
//! application with the committed transaction ids intact.

use alloy_primitives::U256;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use engine_core::{
    CallSpec, EngineError, EngineResult, GasEstimate, OrchestratedPlan, OrchestrationResult,
    ResourceFootprint, RollbackPolicy, ValidationError,
};
use engine_simulation::{SimulationEngine, SimulationOutcome, FEE_PER_COMPUTE_UNIT};

use crate::builder::TransactionBuilder;
use crate::signer::Signer;
use crate::submitter::ProtectedSubmitter;

pub struct Orchestrator {
    simulation: Arc<SimulationEngine>,
    submitter: Arc<ProtectedSubmitter>,
    signer: Arc<dyn Signer>,
    builder: TransactionBuilder,
}

impl Orchestrator {
    pub fn new(
        simulation: Arc<SimulationEngine>,
        submitter: Arc<ProtectedSubmitter>,
        signer: Arc<dyn Signer>,
    ) -> Self {
        Self {
            simulation,
            submitter,
            signer,
            builder: TransactionBuilder::new(),
        }
    }

    /// Validate a step sequence into a runnable plan
    pub fn plan(
        &self,
        steps: Vec<CallSpec>,
        policy: RollbackPolicy,
    ) -> Result<OrchestratedPlan, ValidationError> {
        if steps.is_empty() {
            return Err(ValidationError::EmptyPlan);
        }
        Ok(OrchestratedPlan { steps, policy })
    }

    /// Gas terms for a live step, priced from its pre-flight footprint
    fn gas_from_footprint(footprint: &ResourceFootprint) -> GasEstimate {
        GasEstimate {
            compute_units: footprint.compute_units,
            storage_delta: footprint.storage_delta,
            fee_floor: U256::from(footprint.compute_units) * U256::from(FEE_PER_COMPUTE_UNIT),
        }
    }

    /// Run a plan to completion
    ///
    /// The error type carries infrastructure faults only; every
    /// plan-level outcome, including failure, is an `OrchestrationResult`.
    pub async fn run(&self, plan: &OrchestratedPlan) -> EngineResult<OrchestrationResult> {
        let started = Instant::now();
        info!(steps = plan.len(), policy = ?plan.policy, "plan started");

        // Pre-flight: every step must dry-run cleanly before any submits
        let outcomes = self.simulation.simulate_many(&plan.steps).await;
        let mut footprints = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                SimulationOutcome::Success { footprint, .. } => footprints.push(footprint),
                SimulationOutcome::Failure(failure) => {
                    warn!(step = index, reason = %failure, "pre-flight failed, plan aborted");
                    return Ok(OrchestrationResult::Aborted {
                        step_index: index,
                        reason: failure.to_string(),
                    });
                }
            }
        }

        // Live phase: sequential, in plan order
        let mut committed = Vec::with_capacity(plan.len());
        let mut first_failure: Option<(usize, EngineError)> = None;
        for (index, (step, footprint)) in plan.steps.iter().zip(&footprints).enumerate() {
            let gas = Self::gas_from_footprint(footprint);
            let unsigned = self.builder.build(step, &gas);
            let submission = match self.signer.sign(&unsigned).await {
                Ok(signed) => self.submitter.submit_protected(&signed).await,
                Err(e) => Err(e),
            };

            match submission {
                Ok(result) => committed.push(result.tx_id),
                Err(e) => {
                    warn!(step = index, error = %e, "live submission failed");
                    if first_failure.is_none() {
                        first_failure = Some((index, e));
                    }
                    if plan.policy == RollbackPolicy::AbortRemaining {
                        break;
                    }
                }
            }
        }

        let result = match first_failure {
            None => OrchestrationResult::Committed { tx_ids: committed },
            Some((failed_step, reason)) if committed.is_empty() => OrchestrationResult::Aborted {
                step_index: failed_step,
                reason: reason.to_string(),
            },
            Some((failed_step, reason)) => OrchestrationResult::PartiallyApplied {
                committed,
                failed_step,
                reason: reason.to_string(),
            },
        };

        info!(
            outcome = result.kind(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "plan finished"
        );
        Ok(result)
    }
}
