//! Execution layer: AMM operations, protected submission, orchestration
//!
//! Features:
//! - Quote-then-execute AMM swaps and liquidity operations
//! - Front-running-resistant submission with a standard-path fallback
//! - Cross-contract call sequences with pre-flight atomicity

pub mod amm;
pub mod builder;
pub mod orchestrator;
pub mod signer;
pub mod submitter;

pub use amm::AmmEngine;
pub use builder::TransactionBuilder;
pub use orchestrator::Orchestrator;
pub use signer::{RefusingSigner, Signer, StaticSigner};
pub use submitter::ProtectedSubmitter;
