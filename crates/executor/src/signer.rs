//! Signing capability boundary
//!
//! The engine never sees key material: it hands an unsigned transaction
//! across this trait and gets back a signed one or a failure. Real
//! custody lives with the collaborator implementing it.

use alloy_primitives::Bytes;

use engine_core::{EngineError, SignedTransaction, UnsignedTransaction};

#[async_trait::async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, tx: &UnsignedTransaction) -> Result<SignedTransaction, EngineError>;
}

/// Deterministic signer for tests and dry wiring
pub struct StaticSigner {
    tag: u8,
}

impl StaticSigner {
    pub fn new(tag: u8) -> Self {
        Self { tag }
    }
}

#[async_trait::async_trait]
impl Signer for StaticSigner {
    async fn sign(&self, tx: &UnsignedTransaction) -> Result<SignedTransaction, EngineError> {
        Ok(SignedTransaction {
            unsigned: tx.clone(),
            signature: Bytes::from(vec![self.tag; 65]),
        })
    }
}

/// Signer that always refuses, for failure-path tests
pub struct RefusingSigner;

#[async_trait::async_trait]
impl Signer for RefusingSigner {
    async fn sign(&self, _tx: &UnsignedTransaction) -> Result<SignedTransaction, EngineError> {
        Err(EngineError::Signing("signer refused".to_string()))
    }
}
