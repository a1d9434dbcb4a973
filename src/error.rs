//! Error taxonomy for snapshot operations.
//!
//! A snapshot is all-or-nothing: any failure in any phase aborts the whole
//! operation and surfaces here with enough context (phase, chunk) to act on.
//! The derivation pass has no variant on purpose; it cannot fail.

/// Failure of a node state snapshot operation.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The node count or the address-resolution batches could not be obtained.
    /// Nothing was fetched; no detail phase was started.
    #[error("node address resolution failed: {source:#}")]
    Resolution {
        #[source]
        source: anyhow::Error,
    },

    /// A batched detail read failed (transport error, revert, or decode error).
    /// First error wins; in-flight sibling chunks are discarded.
    #[error("batched {phase} fetch failed: {source:#}")]
    Batch {
        phase: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A native-balance batch failed.
    #[error("{scope} balance fetch failed: {source:#}")]
    BalanceFetch {
        scope: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl SnapshotError {
    pub(crate) fn resolution(source: anyhow::Error) -> Self {
        Self::Resolution { source }
    }

    pub(crate) fn batch(phase: &'static str, source: anyhow::Error) -> Self {
        Self::Batch { phase, source }
    }

    pub(crate) fn balance(scope: &'static str, source: anyhow::Error) -> Self {
        Self::BalanceFetch { scope, source }
    }
}
