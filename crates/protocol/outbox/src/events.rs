//! Event payloads emitted by the outbox.

use alloy_primitives::{Address, B256};

/// Events emitted by the [`Outbox`](crate::Outbox).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", tag = "event"))]
pub enum OutboxEvent {
    /// An entry was created for a confirmed batch of outgoing messages.
    OutboxEntryCreated {
        /// The entry's index.
        outbox_entry_index: u64,
        /// The Merkle root over the batch's sends.
        output_root: B256,
        /// The number of redeemable leaves in the batch.
        num_in_batch: u64,
    },
    /// A single outgoing transaction was redeemed and executed.
    OutBoxTransactionExecuted {
        /// The settlement-side call target.
        dest: Address,
        /// The L2 account the send originated from.
        l2_sender: Address,
        /// The entry the leaf was redeemed against.
        outbox_entry_index: u64,
        /// The leaf index within the entry.
        transaction_index: u64,
    },
}
