//! Transaction builder
//!
//! Turns a call spec plus a gas estimate into an unsigned transaction:
//! entry-point selector, word-padded parameters, gas limit with headroom.

use alloy_primitives::{Bytes, U256};

use engine_core::{CallSpec, GasEstimate, ParamValue, UnsignedTransaction};

/// Gas headroom applied over the estimate, in percent
const GAS_HEADROOM_PCT: u64 = 120;

/// Builds unsigned transactions from call specs
pub struct TransactionBuilder {
    max_fee_per_unit: U256,
    priority_fee_per_unit: U256,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self {
            max_fee_per_unit: U256::from(50_000u64),
            priority_fee_per_unit: U256::from(2_000u64),
        }
    }

    pub fn with_fees(mut self, max_fee_per_unit: U256, priority_fee_per_unit: U256) -> Self {
        self.max_fee_per_unit = max_fee_per_unit;
        self.priority_fee_per_unit = priority_fee_per_unit;
        self
    }

    /// Build a transaction for a call, sized by its gas estimate
    pub fn build(&self, call: &CallSpec, gas: &GasEstimate) -> UnsignedTransaction {
        let data = encode_call(call);
        // Footprints come straight from the node; an absurd value caps
        // the limit instead of overflowing
        let gas_limit = gas
            .compute_units
            .checked_mul(GAS_HEADROOM_PCT)
            .map(|scaled| scaled / 100)
            .unwrap_or(u64::MAX);

        UnsignedTransaction {
            to: call.address,
            value: U256::ZERO,
            data,
            gas_limit,
            max_fee_per_unit: self.max_fee_per_unit,
            priority_fee_per_unit: self.priority_fee_per_unit,
        }
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 4-byte entry-point selector (FNV-1a over the name)
fn selector(entry_point: &str) -> [u8; 4] {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in entry_point.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash.to_be_bytes()
}

fn encode_call(call: &CallSpec) -> Bytes {
    let mut data = Vec::with_capacity(4 + call.params.len() * 32);
    data.extend_from_slice(&selector(&call.entry_point));

    for param in &call.params {
        match param {
            ParamValue::Unsigned(v) => data.extend_from_slice(&v.to_be_bytes::<32>()),
            ParamValue::Address(a) => {
                data.extend_from_slice(&[0u8; 12]);
                data.extend_from_slice(a.as_slice());
            }
            ParamValue::Bool(b) => {
                data.extend_from_slice(&[0u8; 31]);
                data.push(*b as u8);
            }
            ParamValue::Bytes(b) => encode_dynamic(&mut data, b),
            ParamValue::Text(s) => encode_dynamic(&mut data, s.as_bytes()),
        }
    }

    Bytes::from(data)
}

/// Length word followed by the payload, zero-padded to a word boundary
fn encode_dynamic(data: &mut Vec<u8>, payload: &[u8]) {
    data.extend_from_slice(&U256::from(payload.len()).to_be_bytes::<32>());
    data.extend_from_slice(payload);
    let pad = (32 - payload.len() % 32) % 32;
    data.extend(std::iter::repeat(0u8).take(pad));
}
