//! Core types and utilities for the contract interaction engine
//!
//! This crate provides shared types used across all components:
//! - Contract descriptors and the registry
//! - Call specifications and complexity signatures
//! - Swap and liquidity quotes
//! - Orchestration plans
//! - Error taxonomy and configuration

pub mod calls;
pub mod config;
pub mod errors;
pub mod plan;
pub mod quotes;
pub mod registry;
pub mod types;

pub use calls::*;
pub use config::*;
pub use errors::*;
pub use plan::*;
pub use quotes::*;
pub use registry::*;
pub use types::*;
