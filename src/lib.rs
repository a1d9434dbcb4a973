//! # StakeNet State SDK
//!
//! A high-performance Rust library for aggregating per-node on-chain state from
//! EVM staking networks. The SDK fetches dozens of attributes for tens of
//! thousands of registered nodes without issuing one RPC round trip per attribute
//! per node, then derives secondary fields with exact integer arithmetic.
//!
//! ## Overview
//!
//! A snapshot operation runs in strictly ordered phases, all pinned to one
//! reference block:
//!
//! - **Resolution**: the dense index range `[0, N)` is resolved to node addresses
//!   through large multicall batches.
//! - **Detail fetch**: the node set is partitioned into chunks; each chunk's
//!   attribute reads are packed into multicall batches and fetched by bounded
//!   concurrent workers.
//! - **Balances**: native balances for nodes and their fee-distributor
//!   sub-accounts are fetched as two independent batches.
//! - **Derivation**: effective-stake clamping and the distributor balance split
//!   are computed locally, in place, with no further RPC.
//!
//! Snapshots are all-or-nothing: any failed batch aborts the operation and the
//! first error is surfaced with phase and chunk context.

// Core Types
/// Per-node snapshot record and the attribute fetch plan
pub mod node_details;
/// Derived-field computation (stake clamp, balance split)
pub mod derivation;

// Fetch Layer
/// Multicall batch RPC executor
pub mod multicall;
/// Batched native-balance reader
pub mod balance_fetcher;
/// Chunk partitioning and bounded-concurrency scheduling
pub mod scheduler;
/// The snapshot aggregator
pub mod node_state_fetcher;

// Infrastructure
/// HTTP provider construction
pub mod rpc;
/// Smart contract ABIs (read-only, no execution contracts)
pub mod contracts;
/// Contract name -> address resolution with memoization
pub mod registry;
/// Per-snapshot bundle of bound contracts and batchers
pub mod network_contracts;
/// Snapshot error taxonomy
pub mod error;

// Settings & Configuration
/// Configuration management
pub mod settings;

// Re-exports for convenience
pub use balance_fetcher::BalanceBatcher;
pub use error::SnapshotError;
pub use multicall::{Call, Multicall};
pub use network_contracts::{ContractAddresses, NetworkContracts};
pub use node_details::{NodeDetails, UpgradeFlags};
pub use node_state_fetcher::NodeStateFetcher;
pub use registry::ContractRegistry;
pub use settings::Settings;
