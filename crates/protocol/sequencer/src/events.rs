//! Event payloads emitted by the sequencer inbox.

use alloy_primitives::{B256, Bytes};

/// Events emitted by the [`SequencerInbox`](crate::SequencerInbox).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", tag = "event"))]
pub enum SequencerInboxEvent {
    /// A sequencer batch was sealed, with the full transaction payload in
    /// the event.
    SequencerBatchDelivered {
        /// Index of the first message in the batch.
        first_message_num: u64,
        /// Accumulator head before the batch.
        before_acc: B256,
        /// Total sequenced messages after the batch.
        new_message_count: u64,
        /// Accumulator head after the batch.
        after_acc: B256,
        /// The concatenated transaction bytes.
        transactions: Bytes,
        /// The per-transaction byte lengths.
        lengths: Vec<u64>,
        /// The L1 block number recorded for the batch.
        l1_block_number: u64,
        /// The timestamp recorded for the batch.
        timestamp: u64,
        /// The delayed-message cursor after the batch.
        total_delayed_messages_read: u64,
        /// The batch's index in the accumulator array.
        seq_batch_index: u64,
    },
    /// A sequencer batch was sealed by the transaction origin; payload bytes
    /// are recoverable from calldata.
    SequencerBatchDeliveredFromOrigin {
        /// Index of the first message in the batch.
        first_message_num: u64,
        /// Accumulator head before the batch.
        before_acc: B256,
        /// Total sequenced messages after the batch.
        new_message_count: u64,
        /// Accumulator head after the batch.
        after_acc: B256,
        /// The batch's index in the accumulator array.
        seq_batch_index: u64,
    },
    /// An overdue delayed message was spliced in without the sequencer.
    DelayedInboxForced {
        /// Index of the first message in the forced section.
        first_message_num: u64,
        /// Accumulator head before the forced section.
        before_acc: B256,
        /// Total sequenced messages after the forced section.
        new_message_count: u64,
        /// The delayed-message cursor after the forced section.
        total_delayed_messages_read: u64,
        /// The sequencer accumulator head and the delayed accumulator
        /// consumed, after the splice.
        after_acc_and_delayed: [B256; 2],
        /// The batch's index in the accumulator array.
        seq_batch_index: u64,
    },
}
