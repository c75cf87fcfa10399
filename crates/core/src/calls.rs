//! Call specifications and complexity signatures
//!
//! A `CallSpec` is the value object every engine operation consumes: which
//! contract, which entry point, which parameters. Its complexity signature
//! buckets parameter count and total size so the gas cache can key on call
//! *shape* instead of raw values.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::registry::ContractDescriptor;

/// A single call parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    Unsigned(U256),
    Address(Address),
    Bool(bool),
    Bytes(Bytes),
    Text(String),
}

impl ParamValue {
    /// Encoded size in bytes, word-padded for scalar types
    pub fn encoded_len(&self) -> usize {
        match self {
            ParamValue::Unsigned(_) => 32,
            ParamValue::Address(_) => 32,
            ParamValue::Bool(_) => 32,
            ParamValue::Bytes(b) => b.len().max(32),
            ParamValue::Text(s) => s.len().max(32),
        }
    }
}

/// Size class of a parameter list, by total encoded bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    pub fn from_total_bytes(total: usize) -> Self {
        match total {
            0..=256 => SizeClass::Small,
            257..=2048 => SizeClass::Medium,
            _ => SizeClass::Large,
        }
    }
}

/// Shape of a call as seen by the gas cache: arity plus size class,
/// never raw parameter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComplexitySignature {
    pub param_count: u8,
    pub size_class: SizeClass,
}

/// A fully specified contract invocation
///
/// Value type: constructed per invocation, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSpec {
    pub contract: String,
    pub address: Address,
    pub entry_point: String,
    pub params: Vec<ParamValue>,
}

impl CallSpec {
    /// Build a call against a registered contract, validating that the
    /// entry point exists in the descriptor's interface metadata
    pub fn new(
        descriptor: &ContractDescriptor,
        entry_point: &str,
        params: Vec<ParamValue>,
    ) -> Result<Self, ValidationError> {
        if entry_point.is_empty() {
            return Err(ValidationError::MalformedCall(
                "empty entry point".to_string(),
            ));
        }
        if !descriptor.has_entry_point(entry_point) {
            return Err(ValidationError::UnknownEntryPoint {
                contract: descriptor.name.clone(),
                entry_point: entry_point.to_string(),
            });
        }
        Ok(Self {
            contract: descriptor.name.clone(),
            address: descriptor.address,
            entry_point: entry_point.to_string(),
            params,
        })
    }

    /// Build a call without interface validation (caller vouches for it)
    pub fn raw(
        contract: &str,
        address: Address,
        entry_point: &str,
        params: Vec<ParamValue>,
    ) -> Self {
        Self {
            contract: contract.to_string(),
            address,
            entry_point: entry_point.to_string(),
            params,
        }
    }

    pub fn total_param_bytes(&self) -> usize {
        self.params.iter().map(ParamValue::encoded_len).sum()
    }

    /// Complexity signature for gas-cache keying
    pub fn complexity_signature(&self) -> ComplexitySignature {
        ComplexitySignature {
            param_count: self.params.len().min(u8::MAX as usize) as u8,
            size_class: SizeClass::from_total_bytes(self.total_param_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with_params(params: Vec<ParamValue>) -> CallSpec {
        CallSpec::raw("pool", Address::repeat_byte(7), "transfer", params)
    }

    #[test]
    fn test_signature_ignores_values() {
        let a = spec_with_params(vec![ParamValue::Unsigned(U256::from(1)); 50]);
        let b = spec_with_params(vec![ParamValue::Unsigned(U256::from(999_999)); 50]);
        assert_eq!(a.complexity_signature(), b.complexity_signature());
    }

    #[test]
    fn test_signature_tracks_arity() {
        let one = spec_with_params(vec![ParamValue::Unsigned(U256::from(1))]);
        let fifty = spec_with_params(vec![ParamValue::Unsigned(U256::from(1)); 50]);
        assert_ne!(one.complexity_signature(), fifty.complexity_signature());
    }

    #[test]
    fn test_size_class_boundaries() {
        assert_eq!(SizeClass::from_total_bytes(0), SizeClass::Small);
        assert_eq!(SizeClass::from_total_bytes(256), SizeClass::Small);
        assert_eq!(SizeClass::from_total_bytes(257), SizeClass::Medium);
        assert_eq!(SizeClass::from_total_bytes(2048), SizeClass::Medium);
        assert_eq!(SizeClass::from_total_bytes(2049), SizeClass::Large);
    }

    #[test]
    fn test_bytes_param_len() {
        let short = ParamValue::Bytes(Bytes::from(vec![1u8; 4]));
        assert_eq!(short.encoded_len(), 32);
        let long = ParamValue::Bytes(Bytes::from(vec![1u8; 300]));
        assert_eq!(long.encoded_len(), 300);
    }
}
