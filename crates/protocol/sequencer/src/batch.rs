//! Sequencer batch accumulator construction.
//!
//! The functions here are the shared contract between the on-chain inbox and
//! off-chain batch authors: a submitted batch is accepted only if the
//! accumulator recomputed with these folds equals the author's claimed
//! after-accumulator.

use alloy_primitives::{Address, B256, keccak256};
use arbor_primitives::encoding::word;

/// Domain separator spliced in front of a delayed-message section.
const DELAYED_PREFIX: &[u8] = b"Delayed messages:";

/// Hashes the per-batch item prefix binding every transaction in a batch to
/// the sequencer and the recorded L1 block and timestamp.
pub fn item_prefix_hash(sequencer: Address, l1_block_number: u64, timestamp: u64) -> B256 {
    let mut buf = Vec::with_capacity(20 + 32 * 2);
    buf.extend_from_slice(sequencer.as_slice());
    buf.extend_from_slice(&word(l1_block_number));
    buf.extend_from_slice(&word(timestamp));
    keccak256(buf)
}

/// Folds one sequenced transaction into the batch accumulator:
/// `keccak256(acc ‖ seq_num ‖ prefix_hash ‖ keccak256(tx))`.
pub fn add_sequencer_item(acc: B256, seq_num: u64, prefix_hash: B256, tx: &[u8]) -> B256 {
    let mut buf = Vec::with_capacity(32 * 4);
    buf.extend_from_slice(acc.as_slice());
    buf.extend_from_slice(&word(seq_num));
    buf.extend_from_slice(prefix_hash.as_slice());
    buf.extend_from_slice(keccak256(tx).as_slice());
    keccak256(buf)
}

/// Folds a section of delayed messages into the batch accumulator:
/// `keccak256("Delayed messages:" ‖ acc ‖ first_seq_num ‖ new_total_delayed ‖
/// delayed_acc)`.
pub fn add_delayed_messages(
    acc: B256,
    first_seq_num: u64,
    new_total_delayed: u64,
    delayed_acc: B256,
) -> B256 {
    let mut buf = Vec::with_capacity(DELAYED_PREFIX.len() + 32 * 4);
    buf.extend_from_slice(DELAYED_PREFIX);
    buf.extend_from_slice(acc.as_slice());
    buf.extend_from_slice(&word(first_seq_num));
    buf.extend_from_slice(&word(new_total_delayed));
    buf.extend_from_slice(delayed_acc.as_slice());
    keccak256(buf)
}

/// Metadata retained for one sealed sequencer batch.
///
/// The accumulator array alone commits to everything; the metadata lets
/// inclusion proofs be checked without replaying batch submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SequencerBatch {
    /// The batch's index in the accumulator array.
    pub sequence_number: u64,
    /// The accumulator head before this batch.
    pub before_acc: B256,
    /// The accumulator head after this batch.
    pub after_acc: B256,
    /// Total sequenced messages after this batch.
    pub after_message_count: u64,
    /// The delayed-message cursor after this batch.
    pub after_delayed_count: u64,
    /// The delayed accumulator consumed up to the cursor, or zero when the
    /// batch consumed no delayed messages and none were consumed before it.
    pub delayed_acc: B256,
    /// The L1 block number recorded for the batch.
    pub l1_block_number: u64,
    /// The timestamp recorded for the batch.
    pub timestamp: u64,
}
