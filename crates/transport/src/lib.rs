//! RPC transport adapter
//!
//! Thin boundary over the node: dry-run simulation, transaction
//! submission (standard and protected channels), health probing.
//! One production implementation over JSON-RPC/HTTP and one fully
//! deterministic mock for tests.

pub mod adapter;
pub mod health;
pub mod mock;
pub mod rpc;

pub use adapter::{RawSimulation, RpcTransport, SubmissionReceipt};
pub use health::HealthMonitor;
pub use mock::MockTransport;
pub use rpc::HttpRpcTransport;
