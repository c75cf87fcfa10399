//! Contract registry
//!
//! Maps logical contract names to on-chain addresses and interface
//! metadata. Registration is the only mutation path; resolution is
//! read-only. A name registered once keeps its address for the lifetime
//! of the registry.

use alloy_primitives::Address;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ValidationError;

/// Kind of a declared entry-point parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Unsigned,
    Address,
    Bool,
    Bytes,
    Text,
}

/// Declared entry point of a contract interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointMeta {
    pub name: String,
    pub param_schema: Vec<ParamKind>,
}

impl EntryPointMeta {
    pub fn new(name: &str, param_schema: Vec<ParamKind>) -> Self {
        Self {
            name: name.to_string(),
            param_schema,
        }
    }
}

/// Interface metadata: the entry points a contract exposes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceMeta {
    pub entry_points: Vec<EntryPointMeta>,
}

impl InterfaceMeta {
    pub fn new(entry_points: Vec<EntryPointMeta>) -> Self {
        Self { entry_points }
    }
}

/// Registered contract identity, immutable once stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDescriptor {
    pub name: String,
    pub address: Address,
    pub interface: InterfaceMeta,
}

impl ContractDescriptor {
    pub fn has_entry_point(&self, name: &str) -> bool {
        self.interface.entry_points.iter().any(|ep| ep.name == name)
    }

    pub fn entry_point(&self, name: &str) -> Option<&EntryPointMeta> {
        self.interface.entry_points.iter().find(|ep| ep.name == name)
    }
}

/// Name -> descriptor registry
///
/// Exclusively owns its descriptors; callers get shared handles.
#[derive(Debug, Default)]
pub struct ContractRegistry {
    inner: RwLock<HashMap<String, Arc<ContractDescriptor>>>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract under a logical name
    ///
    /// Re-registering the identical (name, address) pair is idempotent.
    /// The same name with a different address is rejected so an identity
    /// cannot silently drift after other components resolved it.
    pub fn register(
        &self,
        name: &str,
        address: Address,
        interface: InterfaceMeta,
    ) -> Result<Arc<ContractDescriptor>, ValidationError> {
        let mut map = self.inner.write();

        if let Some(existing) = map.get(name) {
            if existing.address == address {
                return Ok(Arc::clone(existing));
            }
            return Err(ValidationError::NameCollision {
                name: name.to_string(),
                existing: existing.address,
                attempted: address,
            });
        }

        let descriptor = Arc::new(ContractDescriptor {
            name: name.to_string(),
            address,
            interface,
        });
        map.insert(name.to_string(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Resolve a logical name, read-only
    pub fn resolve(&self, name: &str) -> Result<Arc<ContractDescriptor>, ValidationError> {
        self.inner
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownContract(name.to_string()))
    }

    /// Snapshot of all registered descriptors
    pub fn list(&self) -> Vec<Arc<ContractDescriptor>> {
        self.inner.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
