//! Error types for the outbox.

use crate::merkle::MerkleError;
use alloy_primitives::{Address, B256};
use arbor_bridge::BridgeError;
use thiserror::Error;

/// Errors returned by [`Outbox`](crate::Outbox) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutboxError {
    /// The caller is not the rollup.
    #[error("caller {0} is not the rollup")]
    OnlyRollup(Address),
    /// No live entry exists at the referenced index.
    #[error("no outbox entry at index {0}")]
    UnknownEntry(u64),
    /// The proof does not recompute the entry's root.
    #[error("proof recomputes root {computed}, entry holds {expected}")]
    RootMismatch {
        /// The root stored in the entry.
        expected: B256,
        /// The root the proof recomputes.
        computed: B256,
    },
    /// The leaf at this index was already redeemed.
    #[error("output {0} already spent")]
    AlreadySpent(u64),
    /// The declared send lengths do not cover the send bytes.
    #[error("send lengths sum to {expected} but {actual} bytes were supplied")]
    SendLengthMismatch {
        /// Total bytes the lengths account for.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },
    /// The forwarded settlement-side call reported failure; the leaf stays
    /// unspent and may be retried.
    #[error("forwarded bridge call failed")]
    BridgeCallFailed,
    /// Proof verification failed structurally.
    #[error(transparent)]
    Merkle(#[from] MerkleError),
    /// The bridge refused the outbound call.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}
