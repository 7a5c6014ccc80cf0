//! The sequencer inbox state machine.

use crate::{
    SequencerBatch, SequencerInboxError, SequencerInboxEvent,
    batch::{add_delayed_messages, add_sequencer_item, item_prefix_hash},
};
use alloy_primitives::{Address, B256, Bytes, U256};
use arbor_bridge::Bridge;
use arbor_primitives::{CallContext, CoreConfig, DelayedMessage, MessageKind, chain_accumulator};
use tracing::info;

/// A sequencer batch submission.
///
/// The submitter computes the after-accumulator off-chain; the inbox
/// recomputes it and rejects the batch on any mismatch, so a miscomputed
/// batch can never be sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSubmission {
    /// The concatenated transaction bytes.
    pub transactions: Bytes,
    /// The byte length of each transaction within `transactions`.
    pub lengths: Vec<u64>,
    /// The L1 block number the batch claims to have been authored at.
    pub l1_block_number: u64,
    /// The timestamp the batch claims to have been authored at.
    pub timestamp: u64,
    /// The delayed-message cursor after this batch.
    pub total_delayed_messages_read: u64,
    /// The claimed accumulator head after this batch.
    pub after_acc: B256,
}

/// The delayed message fields supplied to a force-inclusion call.
///
/// These are the full preimage of the delayed accumulator entry at
/// `inbox_seq_num`; the inbox recomputes the entry and refuses to splice a
/// message that does not match what the bridge actually recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForcedMessage {
    /// The message kind discriminant.
    pub kind: MessageKind,
    /// The account the message is attributed to.
    pub sender: Address,
    /// The block number and timestamp the message was enqueued at.
    pub l1_block_and_timestamp: [u64; 2],
    /// The message's delayed inbox index.
    pub inbox_seq_num: u64,
    /// The gas price recorded for the enqueueing transaction.
    pub gas_price_l1: U256,
    /// keccak-256 of the message payload.
    pub data_hash: B256,
}

/// The sequencer's batch accumulator with an enforced maximum inclusion
/// delay for delayed messages.
#[derive(Debug)]
pub struct SequencerInbox {
    address: Address,
    sequencer: Address,
    max_delay_blocks: u64,
    max_delay_seconds: u64,
    accs: Vec<B256>,
    batches: Vec<SequencerBatch>,
    message_count: u64,
    total_delayed_messages_read: u64,
    events: Vec<SequencerInboxEvent>,
}

impl SequencerInbox {
    /// Creates a sequencer inbox with the deployment's sequencer and delay
    /// bounds.
    pub fn new(address: Address, config: &CoreConfig) -> Self {
        Self {
            address,
            sequencer: config.sequencer,
            max_delay_blocks: config.max_delay_blocks,
            max_delay_seconds: config.max_delay_seconds,
            accs: Vec::new(),
            batches: Vec::new(),
            message_count: 0,
            total_delayed_messages_read: 0,
            events: Vec::new(),
        }
    }

    /// The sequencer inbox's own address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The designated sequencer.
    pub const fn sequencer(&self) -> Address {
        self.sequencer
    }

    /// Total sequenced messages across all batches.
    pub const fn message_count(&self) -> u64 {
        self.message_count
    }

    /// The delayed-message cursor: how many delayed messages have been
    /// consumed into the sequencer's accumulator.
    pub const fn total_delayed_messages_read(&self) -> u64 {
        self.total_delayed_messages_read
    }

    /// The number of sealed batches.
    pub fn batch_count(&self) -> u64 {
        self.batches.len() as u64
    }

    /// The accumulator head after batch `index`.
    pub fn inbox_acc(&self, index: u64) -> Option<B256> {
        self.accs.get(usize::try_from(index).ok()?).copied()
    }

    /// Metadata for batch `index`.
    pub fn batch(&self, index: u64) -> Option<&SequencerBatch> {
        self.batches.get(usize::try_from(index).ok()?)
    }

    /// Events emitted so far, in order.
    pub fn events(&self) -> &[SequencerInboxEvent] {
        &self.events
    }

    /// Seals a sequencer batch. Sequencer only.
    pub fn add_sequencer_l2_batch(
        &mut self,
        ctx: &CallContext,
        bridge: &Bridge,
        submission: &BatchSubmission,
    ) -> Result<u64, SequencerInboxError> {
        self.add_batch(ctx, bridge, submission, false)
    }

    /// Seals a sequencer batch without echoing the payload in the event.
    /// Sequencer only, and restricted to the transaction origin so the
    /// payload stays recoverable from calldata.
    pub fn add_sequencer_l2_batch_from_origin(
        &mut self,
        ctx: &CallContext,
        bridge: &Bridge,
        submission: &BatchSubmission,
    ) -> Result<u64, SequencerInboxError> {
        if !ctx.is_origin_call() {
            return Err(SequencerInboxError::OriginOnly);
        }
        self.add_batch(ctx, bridge, submission, true)
    }

    /// Splices an overdue delayed message (and everything before it) into
    /// the sequencer's accumulator. Callable by anyone once the message has
    /// aged past both delay bounds, which is what makes the inclusion delay
    /// a guarantee rather than a courtesy.
    pub fn force_inclusion(
        &mut self,
        ctx: &CallContext,
        bridge: &Bridge,
        total_delayed_messages_read: u64,
        message: &ForcedMessage,
    ) -> Result<u64, SequencerInboxError> {
        if total_delayed_messages_read <= self.total_delayed_messages_read {
            return Err(SequencerInboxError::DelayedBackwards {
                current: self.total_delayed_messages_read,
                requested: total_delayed_messages_read,
            });
        }
        let delivered = bridge.message_count();
        if total_delayed_messages_read > delivered {
            return Err(SequencerInboxError::DelayedTooFar {
                requested: total_delayed_messages_read,
                delivered,
            });
        }
        let expected_seq = total_delayed_messages_read - 1;
        if message.inbox_seq_num != expected_seq {
            return Err(SequencerInboxError::SequenceNumberMismatch {
                expected: expected_seq,
                given: message.inbox_seq_num,
            });
        }

        // The supplied fields must be the actual preimage of the delayed
        // accumulator entry at the claimed index.
        let delayed = DelayedMessage {
            kind: message.kind,
            sender: message.sender,
            block_number: message.l1_block_and_timestamp[0],
            block_timestamp: message.l1_block_and_timestamp[1],
            inbox_seq_num: message.inbox_seq_num,
            gas_price_l1: message.gas_price_l1,
            data_hash: message.data_hash,
        };
        let prior = if expected_seq == 0 {
            B256::ZERO
        } else {
            bridge
                .inbox_acc(expected_seq - 1)
                .ok_or(SequencerInboxError::DelayedAccumulatorMismatch { seq_num: expected_seq })?
        };
        let recorded = bridge
            .inbox_acc(expected_seq)
            .ok_or(SequencerInboxError::DelayedAccumulatorMismatch { seq_num: expected_seq })?;
        if chain_accumulator(prior, delayed.hash()) != recorded {
            return Err(SequencerInboxError::DelayedAccumulatorMismatch { seq_num: expected_seq });
        }

        let earliest_block = message.l1_block_and_timestamp[0]
            .saturating_add(self.max_delay_blocks)
            .saturating_add(1);
        if ctx.block_number < earliest_block {
            return Err(SequencerInboxError::ForceIncludeBlockTooSoon {
                enqueued: message.l1_block_and_timestamp[0],
                earliest: earliest_block,
            });
        }
        let earliest_time = message.l1_block_and_timestamp[1]
            .saturating_add(self.max_delay_seconds)
            .saturating_add(1);
        if ctx.block_timestamp < earliest_time {
            return Err(SequencerInboxError::ForceIncludeTimeTooSoon {
                enqueued: message.l1_block_and_timestamp[1],
                earliest: earliest_time,
            });
        }

        let before_acc = self.head();
        let first_message_num = self.message_count;
        let delayed_acc = recorded;
        let after_acc = add_delayed_messages(
            before_acc,
            first_message_num,
            total_delayed_messages_read,
            delayed_acc,
        );
        let new_message_count = self.message_count
            + (total_delayed_messages_read - self.total_delayed_messages_read);

        let seq_batch_index = self.seal_batch(SequencerBatch {
            sequence_number: self.batch_count(),
            before_acc,
            after_acc,
            after_message_count: new_message_count,
            after_delayed_count: total_delayed_messages_read,
            delayed_acc,
            l1_block_number: ctx.block_number,
            timestamp: ctx.block_timestamp,
        });

        info!(
            target: "sequencer_inbox",
            first_message_num,
            total_delayed_messages_read,
            seq_batch_index,
            "delayed messages force-included",
        );
        self.events.push(SequencerInboxEvent::DelayedInboxForced {
            first_message_num,
            before_acc,
            new_message_count,
            total_delayed_messages_read,
            after_acc_and_delayed: [after_acc, delayed_acc],
            seq_batch_index,
        });
        Ok(seq_batch_index)
    }

    /// Verifies that the messages up to `inbox_count` are covered by the
    /// sealed batch at `batch_index`, returning the batch's end count and
    /// accumulator.
    pub fn prove_batch_contains_sequence_number(
        &self,
        batch_index: u64,
        inbox_count: u64,
    ) -> Result<(u64, B256), SequencerInboxError> {
        let batch =
            self.batch(batch_index).ok_or(SequencerInboxError::UnknownBatch(batch_index))?;
        if inbox_count > batch.after_message_count {
            return Err(SequencerInboxError::SequenceNotInBatch {
                inbox_count,
                batch_end: batch.after_message_count,
            });
        }
        Ok((batch.after_message_count, batch.after_acc))
    }

    fn head(&self) -> B256 {
        self.accs.last().copied().unwrap_or(B256::ZERO)
    }

    fn add_batch(
        &mut self,
        ctx: &CallContext,
        bridge: &Bridge,
        submission: &BatchSubmission,
        from_origin: bool,
    ) -> Result<u64, SequencerInboxError> {
        if ctx.sender != self.sequencer {
            return Err(SequencerInboxError::OnlySequencer(ctx.sender));
        }
        let declared: usize = submission.lengths.iter().map(|len| *len as usize).sum();
        if declared != submission.transactions.len() {
            return Err(SequencerInboxError::LengthMismatch {
                expected: declared,
                actual: submission.transactions.len(),
            });
        }
        if submission.l1_block_number > ctx.block_number {
            return Err(SequencerInboxError::BlockTooNew {
                recorded: submission.l1_block_number,
                current: ctx.block_number,
            });
        }
        if submission.l1_block_number.saturating_add(self.max_delay_blocks) < ctx.block_number {
            return Err(SequencerInboxError::BlockTooOld {
                recorded: submission.l1_block_number,
                current: ctx.block_number,
            });
        }
        if submission.timestamp > ctx.block_timestamp {
            return Err(SequencerInboxError::TimeTooNew {
                recorded: submission.timestamp,
                current: ctx.block_timestamp,
            });
        }
        if submission.timestamp.saturating_add(self.max_delay_seconds) < ctx.block_timestamp {
            return Err(SequencerInboxError::TimeTooOld {
                recorded: submission.timestamp,
                current: ctx.block_timestamp,
            });
        }
        if submission.total_delayed_messages_read < self.total_delayed_messages_read {
            return Err(SequencerInboxError::DelayedBackwards {
                current: self.total_delayed_messages_read,
                requested: submission.total_delayed_messages_read,
            });
        }
        let delivered = bridge.message_count();
        if submission.total_delayed_messages_read > delivered {
            return Err(SequencerInboxError::DelayedTooFar {
                requested: submission.total_delayed_messages_read,
                delivered,
            });
        }
        if submission.lengths.is_empty()
            && submission.total_delayed_messages_read == self.total_delayed_messages_read
        {
            return Err(SequencerInboxError::EmptyBatch);
        }

        let before_acc = self.head();
        let first_message_num = self.message_count;
        let mut acc = before_acc;
        let mut count = first_message_num;

        let prefix =
            item_prefix_hash(self.sequencer, submission.l1_block_number, submission.timestamp);
        let mut offset = 0usize;
        for len in &submission.lengths {
            let end = offset + *len as usize;
            acc = add_sequencer_item(acc, count, prefix, &submission.transactions[offset..end]);
            count += 1;
            offset = end;
        }

        let mut delayed_acc = B256::ZERO;
        if submission.total_delayed_messages_read > self.total_delayed_messages_read {
            delayed_acc = bridge
                .inbox_acc(submission.total_delayed_messages_read - 1)
                .ok_or(SequencerInboxError::DelayedTooFar {
                    requested: submission.total_delayed_messages_read,
                    delivered,
                })?;
            acc = add_delayed_messages(
                acc,
                count,
                submission.total_delayed_messages_read,
                delayed_acc,
            );
            count += submission.total_delayed_messages_read - self.total_delayed_messages_read;
        } else if self.total_delayed_messages_read > 0 {
            delayed_acc =
                bridge.inbox_acc(self.total_delayed_messages_read - 1).unwrap_or(B256::ZERO);
        }

        if acc != submission.after_acc {
            return Err(SequencerInboxError::AfterAccMismatch {
                computed: acc,
                claimed: submission.after_acc,
            });
        }

        let seq_batch_index = self.seal_batch(SequencerBatch {
            sequence_number: self.batch_count(),
            before_acc,
            after_acc: acc,
            after_message_count: count,
            after_delayed_count: submission.total_delayed_messages_read,
            delayed_acc,
            l1_block_number: submission.l1_block_number,
            timestamp: submission.timestamp,
        });

        info!(
            target: "sequencer_inbox",
            first_message_num,
            new_message_count = count,
            txs = submission.lengths.len(),
            total_delayed_messages_read = submission.total_delayed_messages_read,
            seq_batch_index,
            "sequencer batch sealed",
        );
        self.events.push(if from_origin {
            SequencerInboxEvent::SequencerBatchDeliveredFromOrigin {
                first_message_num,
                before_acc,
                new_message_count: count,
                after_acc: acc,
                seq_batch_index,
            }
        } else {
            SequencerInboxEvent::SequencerBatchDelivered {
                first_message_num,
                before_acc,
                new_message_count: count,
                after_acc: acc,
                transactions: submission.transactions.clone(),
                lengths: submission.lengths.clone(),
                l1_block_number: submission.l1_block_number,
                timestamp: submission.timestamp,
                total_delayed_messages_read: submission.total_delayed_messages_read,
                seq_batch_index,
            }
        });
        Ok(seq_batch_index)
    }

    fn seal_batch(&mut self, batch: SequencerBatch) -> u64 {
        let index = self.batch_count();
        self.accs.push(batch.after_acc);
        self.message_count = batch.after_message_count;
        self.total_delayed_messages_read = batch.after_delayed_count;
        self.batches.push(batch);
        index
    }
}
