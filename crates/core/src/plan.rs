//! Orchestration plan types
//!
//! A plan is an ordered sequence of calls intended to succeed or fail as
//! a unit. The atomicity boundary is pre-flight simulation: nothing is
//! submitted unless every step dry-runs cleanly. The ledger offers no
//! compensating-transaction primitive, so a live failure after earlier
//! commits is reported as partial application, never papered over.

use serde::{Deserialize, Serialize};

use crate::calls::CallSpec;

/// What to do with remaining steps once a live submission fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Stop at the first live failure
    #[default]
    AbortRemaining,
    /// Keep submitting the remaining pre-validated steps
    ContinueRemaining,
}

/// Pre-validated ordered call sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratedPlan {
    pub steps: Vec<CallSpec>,
    pub policy: RollbackPolicy,
}

impl OrchestratedPlan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Outcome of running a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestrationResult {
    /// Every step simulated and submitted successfully
    Committed { tx_ids: Vec<String> },
    /// A step failed before anything touched the ledger; no side effects
    Aborted { step_index: usize, reason: String },
    /// Some steps committed on-chain before a later one failed live
    PartiallyApplied {
        committed: Vec<String>,
        failed_step: usize,
        reason: String,
    },
}

impl OrchestrationResult {
    pub fn is_committed(&self) -> bool {
        matches!(self, OrchestrationResult::Committed { .. })
    }

    /// Short tag for the observability sink
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestrationResult::Committed { .. } => "committed",
            OrchestrationResult::Aborted { .. } => "aborted",
            OrchestrationResult::PartiallyApplied { .. } => "partially_applied",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_kinds() {
        let committed = OrchestrationResult::Committed { tx_ids: vec![] };
        assert!(committed.is_committed());
        assert_eq!(committed.kind(), "committed");

        let aborted = OrchestrationResult::Aborted {
            step_index: 2,
            reason: "trapped".to_string(),
        };
        assert!(!aborted.is_committed());
        assert_eq!(aborted.kind(), "aborted");
    }

    #[test]
    fn test_default_policy() {
        assert_eq!(RollbackPolicy::default(), RollbackPolicy::AbortRemaining);
    }
}
