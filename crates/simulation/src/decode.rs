//! Typed decoding of the node's structured return encoding
//!
//! The node returns JSON: bare bools/strings/numbers, arrays for tuples,
//! and tagged objects (`{"type": "u256", "value": "..."}`) for chain
//! scalars. Anything outside that encoding decodes to an explicit error,
//! never a panic.

use alloy_primitives::{Address, U256};

/// Decoded return value of a dry run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    Unit,
    Bool(bool),
    Unsigned(U256),
    Address(Address),
    Bytes(Vec<u8>),
    Text(String),
    Tuple(Vec<DecodedValue>),
}

impl DecodedValue {
    pub fn as_u256(&self) -> Option<U256> {
        match self {
            DecodedValue::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            DecodedValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[DecodedValue]> {
        match self {
            DecodedValue::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Tuple element as an unsigned scalar
    pub fn tuple_u256(&self, index: usize) -> Option<U256> {
        self.as_tuple()?.get(index)?.as_u256()
    }
}

fn parse_u256(text: &str) -> Result<U256, String> {
    let parsed = if let Some(hex) = text.strip_prefix("0x") {
        U256::from_str_radix(hex, 16)
    } else {
        U256::from_str_radix(text, 10)
    };
    parsed.map_err(|e| format!("bad u256 {text:?}: {e}"))
}

/// Decode one return value; `Err` carries the reason for the
/// decode-failure outcome
pub fn decode_value(value: &serde_json::Value) -> Result<DecodedValue, String> {
    match value {
        serde_json::Value::Null => Ok(DecodedValue::Unit),
        serde_json::Value::Bool(b) => Ok(DecodedValue::Bool(*b)),
        serde_json::Value::String(s) => Ok(DecodedValue::Text(s.clone())),
        serde_json::Value::Number(n) => {
            let raw = n
                .as_u64()
                .ok_or_else(|| format!("unsupported number encoding: {n}"))?;
            Ok(DecodedValue::Unsigned(U256::from(raw)))
        }
        serde_json::Value::Array(items) => {
            let decoded = items
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DecodedValue::Tuple(decoded))
        }
        serde_json::Value::Object(map) => {
            let kind = map
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| "object without type tag".to_string())?;
            let raw = map
                .get("value")
                .ok_or_else(|| format!("{kind} object without value"))?;

            match kind {
                "u256" => match raw {
                    serde_json::Value::String(s) => parse_u256(s).map(DecodedValue::Unsigned),
                    serde_json::Value::Number(n) => n
                        .as_u64()
                        .map(|v| DecodedValue::Unsigned(U256::from(v)))
                        .ok_or_else(|| format!("bad u256 number: {n}")),
                    other => Err(format!("bad u256 value: {other}")),
                },
                "address" => {
                    let text = raw
                        .as_str()
                        .ok_or_else(|| "address value must be a string".to_string())?;
                    text.parse::<Address>()
                        .map(DecodedValue::Address)
                        .map_err(|e| format!("bad address {text:?}: {e}"))
                }
                "bytes" => {
                    let text = raw
                        .as_str()
                        .ok_or_else(|| "bytes value must be a hex string".to_string())?;
                    let stripped = text.strip_prefix("0x").unwrap_or(text);
                    alloy_primitives::hex::decode(stripped)
                        .map(DecodedValue::Bytes)
                        .map_err(|e| format!("bad bytes {text:?}: {e}"))
                }
                other => Err(format!("unknown value type: {other}")),
            }
        }
    }
}
