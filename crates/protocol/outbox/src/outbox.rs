//! The outbox state machine: entry creation and leaf redemption.

use crate::{
    OutboxError, OutboxEvent,
    merkle::{calculate_merkle_root, generate_root},
};
use alloy_primitives::{Address, B256, Bytes, U256, keccak256, map::HashSet};
use arbor_bridge::Bridge;
use arbor_primitives::{CallContext, CallDispatcher, CallOutcome, encoding};
use tracing::{debug, info};

/// Kind discriminant of an L2-to-L1 transaction send.
const SEND_TX_TO_L1: u8 = 3;

/// An L2-originated send redeemable on the settlement side.
///
/// The byte encoding of these fields is the leaf preimage; redemption
/// recomputes it from the caller-supplied fields, so any field mismatch
/// yields a different leaf and the proof fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2ToL1Send {
    /// The L2 account the send originated from.
    pub l2_sender: Address,
    /// The settlement-side call target.
    pub dest: Address,
    /// The L2 block the send was issued in.
    pub l2_block: u64,
    /// The settlement-side block recorded for the send.
    pub l1_block: u64,
    /// The L2 timestamp the send was issued at.
    pub l2_timestamp: u64,
    /// The native value forwarded with the call.
    pub amount: U256,
    /// The settlement-side calldata.
    pub calldata: Bytes,
}

impl L2ToL1Send {
    /// Encodes the send into its leaf preimage:
    /// `0x03 ‖ l2_sender ‖ dest ‖ l2_block ‖ l1_block ‖ l2_timestamp ‖
    /// amount ‖ calldata`, integers as 32-byte big-endian words.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + 20 * 2 + 32 * 4 + self.calldata.len());
        buf.push(SEND_TX_TO_L1);
        buf.extend_from_slice(self.l2_sender.as_slice());
        buf.extend_from_slice(self.dest.as_slice());
        buf.extend_from_slice(&encoding::word(self.l2_block));
        buf.extend_from_slice(&encoding::word(self.l1_block));
        buf.extend_from_slice(&encoding::word(self.l2_timestamp));
        buf.extend_from_slice(&encoding::u256_word(self.amount));
        buf.extend_from_slice(&self.calldata);
        buf
    }

    /// The send's Merkle leaf: keccak-256 of [`L2ToL1Send::to_bytes`].
    pub fn item_hash(&self) -> B256 {
        keccak256(self.to_bytes())
    }
}

/// Splits concatenated send bytes into individual sends by their declared
/// lengths.
pub fn split_sends<'a>(data: &'a [u8], lengths: &[u64]) -> Result<Vec<&'a [u8]>, OutboxError> {
    let declared: usize = lengths.iter().map(|len| *len as usize).sum();
    if declared != data.len() {
        return Err(OutboxError::SendLengthMismatch { expected: declared, actual: data.len() });
    }
    let mut sends = Vec::with_capacity(lengths.len());
    let mut offset = 0usize;
    for len in lengths {
        let end = offset + *len as usize;
        sends.push(&data[offset..end]);
        offset = end;
    }
    Ok(sends)
}

/// One Merkle root's worth of redeemable outgoing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    root: B256,
    num_remaining: u64,
    spent: HashSet<u64>,
}

impl OutboxEntry {
    fn new(root: B256, num_in_batch: u64) -> Self {
        Self { root, num_remaining: num_in_batch, spent: HashSet::default() }
    }

    /// The Merkle root over the batch's sends.
    pub const fn root(&self) -> B256 {
        self.root
    }

    /// Unredeemed leaves remaining in the batch.
    pub const fn num_remaining(&self) -> u64 {
        self.num_remaining
    }

    /// Whether the leaf at `index` has been redeemed.
    pub fn is_spent(&self, index: u64) -> bool {
        self.spent.contains(&index)
    }
}

/// The redemption context of the send currently being executed.
///
/// Call targets authenticate the L2 originator through these fields while a
/// redemption is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L2ToL1Context {
    /// The L2 account the send originated from.
    pub sender: Address,
    /// The L2 block the send was issued in.
    pub l2_block: u64,
    /// The settlement-side block recorded for the send.
    pub l1_block: u64,
    /// The L2 timestamp the send was issued at.
    pub timestamp: u64,
    /// The leaf index being redeemed.
    pub output_id: u64,
}

/// Redeems confirmed outgoing messages against their entries' Merkle roots,
/// marking each leaf spent exactly once and forwarding the call through the
/// bridge.
#[derive(Debug)]
pub struct Outbox {
    address: Address,
    rollup: Address,
    entries: Vec<Option<OutboxEntry>>,
    context: Option<L2ToL1Context>,
    events: Vec<OutboxEvent>,
}

impl Outbox {
    /// Creates an outbox writable only by `rollup`.
    pub const fn new(address: Address, rollup: Address) -> Self {
        Self { address, rollup, entries: Vec::new(), context: None, events: Vec::new() }
    }

    /// The outbox's own address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The number of entry slots ever created, including destroyed ones.
    pub fn entries_len(&self) -> u64 {
        self.entries.len() as u64
    }

    /// The live entry at `index`, if any.
    pub fn entry(&self, index: u64) -> Option<&OutboxEntry> {
        self.entries.get(usize::try_from(index).ok()?)?.as_ref()
    }

    /// The L2 sender of the redemption in flight, if any.
    pub fn l2_to_l1_sender(&self) -> Option<Address> {
        self.context.map(|ctx| ctx.sender)
    }

    /// The L2 block of the redemption in flight, if any.
    pub fn l2_to_l1_block(&self) -> Option<u64> {
        self.context.map(|ctx| ctx.l2_block)
    }

    /// The L2 timestamp of the redemption in flight, if any.
    pub fn l2_to_l1_timestamp(&self) -> Option<u64> {
        self.context.map(|ctx| ctx.timestamp)
    }

    /// The leaf index of the redemption in flight, if any.
    pub fn l2_to_l1_output_id(&self) -> Option<u64> {
        self.context.map(|ctx| ctx.output_id)
    }

    /// Events emitted so far, in order.
    pub fn events(&self) -> &[OutboxEvent] {
        &self.events
    }

    /// Creates an entry for a confirmed batch of outgoing messages. Rollup
    /// only. Returns the entry index, or `None` for an empty batch.
    pub fn process_outgoing_messages(
        &mut self,
        ctx: &CallContext,
        sends_data: &[u8],
        send_lengths: &[u64],
    ) -> Result<Option<u64>, OutboxError> {
        if ctx.sender != self.rollup {
            return Err(OutboxError::OnlyRollup(ctx.sender));
        }
        let sends = split_sends(sends_data, send_lengths)?;
        if sends.is_empty() {
            return Ok(None);
        }

        let leaves: Vec<B256> = sends.iter().map(keccak256).collect();
        let output_root = generate_root(&leaves);
        let num_in_batch = leaves.len() as u64;
        let outbox_entry_index = self.entries.len() as u64;
        self.entries.push(Some(OutboxEntry::new(output_root, num_in_batch)));

        info!(
            target: "outbox",
            outbox_entry_index,
            %output_root,
            num_in_batch,
            "outbox entry created",
        );
        self.events.push(OutboxEvent::OutboxEntryCreated {
            outbox_entry_index,
            output_root,
            num_in_batch,
        });
        Ok(Some(outbox_entry_index))
    }

    /// Redeems one send against the entry at `outbox_index` and forwards the
    /// authorized call through the bridge.
    ///
    /// A send redeems at most once. A failing forwarded call aborts the
    /// redemption wholesale: the leaf stays unspent and may be retried.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_transaction(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        dispatcher: &mut dyn CallDispatcher,
        outbox_index: u64,
        proof: &[B256],
        index: u64,
        send: &L2ToL1Send,
    ) -> Result<CallOutcome, OutboxError> {
        let computed = calculate_merkle_root(proof, index, send.item_hash())?;
        let entry = self
            .entries
            .get(usize::try_from(outbox_index).unwrap_or(usize::MAX))
            .and_then(Option::as_ref)
            .ok_or(OutboxError::UnknownEntry(outbox_index))?;
        if entry.root != computed {
            return Err(OutboxError::RootMismatch { expected: entry.root, computed });
        }
        if entry.is_spent(index) {
            return Err(OutboxError::AlreadySpent(index));
        }

        self.context = Some(L2ToL1Context {
            sender: send.l2_sender,
            l2_block: send.l2_block,
            l1_block: send.l1_block,
            timestamp: send.l2_timestamp,
            output_id: index,
        });
        let outcome = bridge.execute_call(
            &ctx.forward(self.address),
            dispatcher,
            send.dest,
            send.amount,
            &send.calldata,
        );
        self.context = None;
        let outcome = outcome?;
        if !outcome.success {
            return Err(OutboxError::BridgeCallFailed);
        }

        // The call succeeded; only now does the leaf burn.
        let entry = self.entries[outbox_index as usize].as_mut().expect("entry checked above");
        entry.spent.insert(index);
        entry.num_remaining -= 1;
        let exhausted = entry.num_remaining == 0;

        debug!(
            target: "outbox",
            outbox_entry_index = outbox_index,
            transaction_index = index,
            dest = %send.dest,
            "outbox transaction executed",
        );
        self.events.push(OutboxEvent::OutBoxTransactionExecuted {
            dest: send.dest,
            l2_sender: send.l2_sender,
            outbox_entry_index: outbox_index,
            transaction_index: index,
        });

        if exhausted {
            self.entries[outbox_index as usize] = None;
            info!(target: "outbox", outbox_entry_index = outbox_index, "outbox entry exhausted");
        }
        Ok(outcome)
    }
}
