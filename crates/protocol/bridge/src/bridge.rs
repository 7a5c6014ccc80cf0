//! The delayed message accumulator and outbound call dispatcher.

use crate::{BridgeError, BridgeEvent};
use alloy_primitives::{Address, B256, Bytes, U256, map::HashSet};
use arbor_primitives::{
    CallContext, CallDispatcher, CallOutcome, DelayedMessage, InboxAccumulator, MessageKind,
};
use tracing::{debug, info};

/// The single source of truth for inbound delayed messages and the
/// dispatcher of authorized outbound calls.
///
/// Inbound: allow-listed inboxes append message hashes to the delayed
/// accumulator. Outbound: the currently active outbox may route calls to the
/// settlement side through [`Bridge::execute_call`]. Both allow-lists are
/// owner-administered.
#[derive(Debug)]
pub struct Bridge {
    address: Address,
    owner: Address,
    allowed_inboxes: HashSet<Address>,
    allowed_outboxes: HashSet<Address>,
    active_outbox: Option<Address>,
    accumulator: InboxAccumulator,
    events: Vec<BridgeEvent>,
}

impl Bridge {
    /// Creates a bridge owned by `owner` with empty allow-lists.
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            allowed_inboxes: HashSet::default(),
            allowed_outboxes: HashSet::default(),
            active_outbox: None,
            accumulator: InboxAccumulator::new(),
            events: Vec::new(),
        }
    }

    /// The bridge's own address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The owner permitted to administer the allow-lists.
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// The number of delayed messages delivered so far.
    pub fn message_count(&self) -> u64 {
        self.accumulator.count()
    }

    /// The accumulator value after message `index`, if it exists.
    pub fn inbox_acc(&self, index: u64) -> Option<B256> {
        self.accumulator.acc_at(index)
    }

    /// The delayed accumulator.
    pub const fn accumulator(&self) -> &InboxAccumulator {
        &self.accumulator
    }

    /// Whether `inbox` may deliver messages.
    pub fn allowed_inbox(&self, inbox: Address) -> bool {
        self.allowed_inboxes.contains(&inbox)
    }

    /// Whether `outbox` is on the outbox allow-list.
    pub fn allowed_outbox(&self, outbox: Address) -> bool {
        self.allowed_outboxes.contains(&outbox)
    }

    /// The outbox currently permitted to call [`Bridge::execute_call`].
    pub const fn active_outbox(&self) -> Option<Address> {
        self.active_outbox
    }

    /// Events emitted so far, in order.
    pub fn events(&self) -> &[BridgeEvent] {
        &self.events
    }

    /// Adds or removes an inbox from the allow-list. Owner only.
    pub fn set_inbox(
        &mut self,
        ctx: &CallContext,
        inbox: Address,
        enabled: bool,
    ) -> Result<(), BridgeError> {
        self.require_owner(ctx)?;
        if enabled {
            self.allowed_inboxes.insert(inbox);
        } else {
            self.allowed_inboxes.remove(&inbox);
        }
        info!(target: "bridge", %inbox, enabled, "inbox allow-list updated");
        self.events.push(BridgeEvent::InboxToggled { inbox, enabled });
        Ok(())
    }

    /// Adds or removes an outbox from the allow-list. Owner only.
    ///
    /// Enabling an outbox makes it the active one; disabling the active
    /// outbox leaves no outbox active until another is enabled.
    pub fn set_outbox(
        &mut self,
        ctx: &CallContext,
        outbox: Address,
        enabled: bool,
    ) -> Result<(), BridgeError> {
        self.require_owner(ctx)?;
        if enabled {
            self.allowed_outboxes.insert(outbox);
            self.active_outbox = Some(outbox);
        } else {
            self.allowed_outboxes.remove(&outbox);
            if self.active_outbox == Some(outbox) {
                self.active_outbox = None;
            }
        }
        info!(target: "bridge", %outbox, enabled, "outbox allow-list updated");
        self.events.push(BridgeEvent::OutboxToggled { outbox, enabled });
        Ok(())
    }

    /// Appends a message to the delayed accumulator and returns its index.
    ///
    /// Callable only by an allow-listed inbox. The emitted event carries the
    /// accumulator value preceding the append so the chain can be replayed
    /// from events alone.
    pub fn deliver_message_to_inbox(
        &mut self,
        ctx: &CallContext,
        kind: MessageKind,
        sender: Address,
        message_data_hash: B256,
    ) -> Result<u64, BridgeError> {
        if !self.allowed_inboxes.contains(&ctx.sender) {
            return Err(BridgeError::NotInbox(ctx.sender));
        }

        let message = DelayedMessage {
            kind,
            sender,
            block_number: ctx.block_number,
            block_timestamp: ctx.block_timestamp,
            inbox_seq_num: self.accumulator.count(),
            gas_price_l1: ctx.gas_price,
            data_hash: message_data_hash,
        };
        let (message_index, before_inbox_acc) = self.accumulator.append(message.hash());

        debug!(
            target: "bridge",
            message_index,
            ?kind,
            %sender,
            "delayed message delivered",
        );
        self.events.push(BridgeEvent::MessageDelivered {
            message_index,
            before_inbox_acc,
            inbox: ctx.sender,
            kind,
            sender,
            message_data_hash,
        });
        Ok(message_index)
    }

    /// Routes an outbound call through the dispatcher on behalf of the
    /// active outbox.
    ///
    /// The callee's failure is surfaced in the returned [`CallOutcome`],
    /// never raised: state committed by the caller before dispatching stays
    /// committed regardless of how the callee fares.
    pub fn execute_call(
        &mut self,
        ctx: &CallContext,
        dispatcher: &mut dyn CallDispatcher,
        dest: Address,
        amount: U256,
        data: &[u8],
    ) -> Result<CallOutcome, BridgeError> {
        if self.active_outbox != Some(ctx.sender) {
            return Err(BridgeError::NotActiveOutbox(ctx.sender));
        }

        let outcome = dispatcher.call(dest, amount, data);
        debug!(
            target: "bridge",
            %dest,
            %amount,
            success = outcome.success,
            "outbound call executed",
        );
        self.events.push(BridgeEvent::BridgeCallTriggered {
            outbox: ctx.sender,
            dest,
            amount,
            data: Bytes::copy_from_slice(data),
        });
        Ok(outcome)
    }

    fn require_owner(&self, ctx: &CallContext) -> Result<(), BridgeError> {
        if ctx.sender != self.owner {
            return Err(BridgeError::NotOwner(ctx.sender));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, keccak256};
    use arbor_primitives::{MockDispatcher, chain_accumulator};

    const OWNER: Address = address!("0x00000000000000000000000000000000000000a0");
    const INBOX: Address = address!("0x00000000000000000000000000000000000000a1");
    const OUTBOX: Address = address!("0x00000000000000000000000000000000000000a2");
    const USER: Address = address!("0x00000000000000000000000000000000000000a3");

    fn bridge_with_inbox() -> Bridge {
        let mut bridge = Bridge::new(Address::with_last_byte(0xbb), OWNER);
        let ctx = CallContext::new(OWNER, 1, 1_000);
        bridge.set_inbox(&ctx, INBOX, true).unwrap();
        bridge
    }

    #[test]
    fn delivery_requires_allow_listed_inbox() {
        let mut bridge = bridge_with_inbox();
        let ctx = CallContext::new(USER, 5, 5_000);
        let err = bridge
            .deliver_message_to_inbox(&ctx, MessageKind::L2Message, USER, keccak256(b"payload"))
            .unwrap_err();
        assert_eq!(err, BridgeError::NotInbox(USER));
        assert_eq!(bridge.message_count(), 0);
    }

    #[test]
    fn delivery_events_replay_the_accumulator() {
        let mut bridge = bridge_with_inbox();
        let ctx = CallContext::new(INBOX, 5, 5_000);
        for i in 0..4u64 {
            let hash = keccak256(i.to_be_bytes());
            let index =
                bridge.deliver_message_to_inbox(&ctx, MessageKind::L2Message, USER, hash).unwrap();
            assert_eq!(index, i);
        }

        let mut head = B256::ZERO;
        for (i, event) in bridge.events().iter().skip(1).enumerate() {
            let BridgeEvent::MessageDelivered {
                message_index,
                before_inbox_acc,
                kind,
                sender,
                message_data_hash,
                ..
            } = event
            else {
                panic!("expected delivery event");
            };
            assert_eq!(*message_index, i as u64);
            assert_eq!(*before_inbox_acc, head);

            let message = DelayedMessage {
                kind: *kind,
                sender: *sender,
                block_number: ctx.block_number,
                block_timestamp: ctx.block_timestamp,
                inbox_seq_num: *message_index,
                gas_price_l1: ctx.gas_price,
                data_hash: *message_data_hash,
            };
            head = chain_accumulator(head, message.hash());
            assert_eq!(bridge.inbox_acc(*message_index), Some(head));
        }
    }

    #[test]
    fn execute_call_requires_active_outbox() {
        let mut bridge = bridge_with_inbox();
        let owner_ctx = CallContext::new(OWNER, 1, 1_000);
        bridge.set_outbox(&owner_ctx, OUTBOX, true).unwrap();

        let mut dispatcher = MockDispatcher::new();
        let err = bridge
            .execute_call(&CallContext::new(USER, 2, 2_000), &mut dispatcher, USER, U256::ZERO, &[])
            .unwrap_err();
        assert_eq!(err, BridgeError::NotActiveOutbox(USER));
        assert!(dispatcher.calls.is_empty());
    }

    #[test]
    fn execute_call_reports_failure_without_raising() {
        let mut bridge = bridge_with_inbox();
        let owner_ctx = CallContext::new(OWNER, 1, 1_000);
        bridge.set_outbox(&owner_ctx, OUTBOX, true).unwrap();

        let dest = address!("0x00000000000000000000000000000000000000ff");
        let mut dispatcher = MockDispatcher::new();
        dispatcher.fail_calls_to(dest);

        let outcome = bridge
            .execute_call(
                &CallContext::new(OUTBOX, 2, 2_000),
                &mut dispatcher,
                dest,
                U256::from(7),
                b"calldata",
            )
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(dispatcher.calls.len(), 1);
        assert_eq!(dispatcher.calls[0].dest, dest);
    }

    #[test]
    fn disabling_the_active_outbox_clears_it() {
        let mut bridge = bridge_with_inbox();
        let owner_ctx = CallContext::new(OWNER, 1, 1_000);
        bridge.set_outbox(&owner_ctx, OUTBOX, true).unwrap();
        assert_eq!(bridge.active_outbox(), Some(OUTBOX));

        bridge.set_outbox(&owner_ctx, OUTBOX, false).unwrap();
        assert_eq!(bridge.active_outbox(), None);
        assert!(!bridge.allowed_outbox(OUTBOX));
    }

    #[test]
    fn allow_list_administration_is_owner_gated() {
        let mut bridge = bridge_with_inbox();
        let ctx = CallContext::new(USER, 1, 1_000);
        assert_eq!(bridge.set_inbox(&ctx, USER, true), Err(BridgeError::NotOwner(USER)));
        assert_eq!(bridge.set_outbox(&ctx, USER, true), Err(BridgeError::NotOwner(USER)));
    }
}
