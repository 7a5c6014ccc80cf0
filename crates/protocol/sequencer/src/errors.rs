//! Error types for the sequencer inbox.

use alloy_primitives::{Address, B256};
use thiserror::Error;

/// Errors returned by [`SequencerInbox`](crate::SequencerInbox) operations.
///
/// Each time-window and cursor violation is its own variant so validators
/// can branch on the failure cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencerInboxError {
    /// The caller is not the designated sequencer.
    #[error("caller {0} is not the sequencer")]
    OnlySequencer(Address),
    /// An origin-only entry point was invoked through a contract.
    #[error("entry point restricted to the transaction origin")]
    OriginOnly,
    /// The declared section lengths do not cover the transaction bytes.
    #[error("section lengths sum to {expected} but {actual} transaction bytes were supplied")]
    LengthMismatch {
        /// Total bytes the lengths account for.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },
    /// The batch carries no transactions and advances no delayed messages.
    #[error("batch is empty")]
    EmptyBatch,
    /// The recorded L1 block is ahead of the current block.
    #[error("recorded block {recorded} is newer than the current block {current}")]
    BlockTooNew {
        /// Block number recorded in the batch.
        recorded: u64,
        /// Current block number.
        current: u64,
    },
    /// The recorded L1 block lags the current block by more than the delay
    /// window.
    #[error("recorded block {recorded} is older than the delay window at block {current}")]
    BlockTooOld {
        /// Block number recorded in the batch.
        recorded: u64,
        /// Current block number.
        current: u64,
    },
    /// The recorded timestamp is ahead of the current timestamp.
    #[error("recorded timestamp {recorded} is newer than the current timestamp {current}")]
    TimeTooNew {
        /// Timestamp recorded in the batch.
        recorded: u64,
        /// Current timestamp.
        current: u64,
    },
    /// The recorded timestamp lags the current timestamp by more than the
    /// delay window.
    #[error("recorded timestamp {recorded} is older than the delay window at timestamp {current}")]
    TimeTooOld {
        /// Timestamp recorded in the batch.
        recorded: u64,
        /// Current timestamp.
        current: u64,
    },
    /// The delayed-message cursor would move backwards.
    #[error("delayed cursor would regress from {current} to {requested}")]
    DelayedBackwards {
        /// The cursor as stored.
        current: u64,
        /// The cursor the caller requested.
        requested: u64,
    },
    /// The delayed-message cursor points past the delivered messages.
    #[error("delayed cursor {requested} exceeds the {delivered} delivered messages")]
    DelayedTooFar {
        /// The cursor the caller requested.
        requested: u64,
        /// Messages actually delivered to the bridge.
        delivered: u64,
    },
    /// The recomputed accumulator does not match the claimed one.
    #[error("computed batch accumulator {computed} does not match claimed {claimed}")]
    AfterAccMismatch {
        /// The accumulator recomputed on-chain.
        computed: B256,
        /// The accumulator the submitter claimed.
        claimed: B256,
    },
    /// The forced message's sequence number is not the last one covered by
    /// the new cursor.
    #[error("forced message sequence number {given} must be {expected}")]
    SequenceNumberMismatch {
        /// The sequence number implied by the cursor.
        expected: u64,
        /// The sequence number supplied.
        given: u64,
    },
    /// The supplied message fields do not hash into the delayed accumulator
    /// at the claimed sequence number.
    #[error("supplied message does not match the delayed accumulator at index {seq_num}")]
    DelayedAccumulatorMismatch {
        /// The claimed sequence number.
        seq_num: u64,
    },
    /// Force inclusion attempted before the block delay bound elapsed.
    #[error("message enqueued at block {enqueued} cannot be forced until block {earliest}")]
    ForceIncludeBlockTooSoon {
        /// Block the message was enqueued at.
        enqueued: u64,
        /// First block at which forcing is permitted.
        earliest: u64,
    },
    /// Force inclusion attempted before the time delay bound elapsed.
    #[error("message enqueued at timestamp {enqueued} cannot be forced until timestamp {earliest}")]
    ForceIncludeTimeTooSoon {
        /// Timestamp the message was enqueued at.
        enqueued: u64,
        /// First timestamp at which forcing is permitted.
        earliest: u64,
    },
    /// No batch exists at the referenced index.
    #[error("no sequencer batch at index {0}")]
    UnknownBatch(u64),
    /// The referenced batch ends before the claimed message count.
    #[error("batch ends at message count {batch_end}, which does not cover {inbox_count}")]
    SequenceNotInBatch {
        /// The count the caller claimed is covered.
        inbox_count: u64,
        /// Where the batch actually ends.
        batch_end: u64,
    },
}
