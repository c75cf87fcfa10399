//! Dry-run simulation and gas estimation
//!
//! Features:
//! - Concurrent simulation with a bounded in-flight limit
//! - Typed decoding of node return values
//! - Single-flight, time-expiring gas estimate cache keyed by call shape

pub mod decode;
pub mod engine;
pub mod gas;

pub use decode::{decode_value, DecodedValue};
pub use engine::{SimulationEngine, SimulationFailure, SimulationOutcome};
pub use gas::{GasCacheStats, GasEstimator, OperationKind, FEE_PER_COMPUTE_UNIT};
