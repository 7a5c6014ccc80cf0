//! The user-facing delayed inbox entry points.

use crate::{Bridge, InboxError, InboxEvent};
use alloy_primitives::{Address, Bytes, U256, keccak256};
use arbor_primitives::{CallContext, MessageKind, encoding};
use tracing::debug;

/// The always-available message entry path into the rollup.
///
/// Every entry point hashes its payload, routes the hash through
/// [`Bridge::deliver_message_to_inbox`], and emits the full payload (or, for
/// the origin-only variants, just the assigned index) as an inbox event.
#[derive(Debug)]
pub struct Inbox {
    address: Address,
    events: Vec<InboxEvent>,
}

/// Parameters of a retryable ticket submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableTicket {
    /// The L2 call target.
    pub dest: Address,
    /// The value forwarded with the L2 call.
    pub l2_call_value: U256,
    /// The maximum cost deducted for ticket submission.
    pub max_submission_cost: U256,
    /// Refund address for unused submission cost.
    pub submission_refund_address: Address,
    /// Refund address for the ticket's value if it expires.
    pub value_refund_address: Address,
    /// The gas limit for the redemption attempt.
    pub max_gas: u64,
    /// The gas price for the redemption attempt.
    pub gas_price: U256,
    /// The L2 calldata.
    pub data: Bytes,
}

impl RetryableTicket {
    /// Encodes the ticket into the delayed message payload layout:
    /// `dest ‖ l2_call_value ‖ deposit ‖ max_submission_cost ‖
    /// submission_refund ‖ value_refund ‖ max_gas ‖ gas_price ‖ data_len ‖
    /// data`, integers as 32-byte big-endian words.
    pub fn encode(&self, deposit: U256) -> Vec<u8> {
        let mut buf = Vec::with_capacity(20 * 3 + 32 * 6 + self.data.len());
        buf.extend_from_slice(self.dest.as_slice());
        buf.extend_from_slice(&encoding::u256_word(self.l2_call_value));
        buf.extend_from_slice(&encoding::u256_word(deposit));
        buf.extend_from_slice(&encoding::u256_word(self.max_submission_cost));
        buf.extend_from_slice(self.submission_refund_address.as_slice());
        buf.extend_from_slice(self.value_refund_address.as_slice());
        buf.extend_from_slice(&encoding::word(self.max_gas));
        buf.extend_from_slice(&encoding::u256_word(self.gas_price));
        buf.extend_from_slice(&encoding::word(self.data.len() as u64));
        buf.extend_from_slice(&self.data);
        buf
    }
}

impl Inbox {
    /// Creates an inbox at `address`.
    pub const fn new(address: Address) -> Self {
        Self { address, events: Vec::new() }
    }

    /// The inbox's own address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Events emitted so far, in order.
    pub fn events(&self) -> &[InboxEvent] {
        &self.events
    }

    /// Delivers an arbitrary L2 message payload.
    pub fn send_l2_message(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        data: Bytes,
    ) -> Result<u64, InboxError> {
        self.deliver(ctx, bridge, MessageKind::L2Message, ctx.sender, data, false)
    }

    /// Delivers an L2 message payload; origin-only, the event carries just
    /// the index since the payload is recoverable from calldata.
    pub fn send_l2_message_from_origin(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        data: Bytes,
    ) -> Result<u64, InboxError> {
        if !ctx.is_origin_call() {
            return Err(InboxError::OriginOnly);
        }
        self.deliver(ctx, bridge, MessageKind::L2Message, ctx.sender, data, true)
    }

    /// Deposits the call's native value to `dest` on the executing side.
    pub fn deposit_eth(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        dest: Address,
    ) -> Result<u64, InboxError> {
        let data = Self::deposit_payload(dest, ctx.value);
        self.deliver(ctx, bridge, MessageKind::EthDeposit, ctx.sender, data.into(), false)
    }

    /// Origin-only variant of [`Inbox::deposit_eth`].
    pub fn deposit_eth_from_origin(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        dest: Address,
    ) -> Result<u64, InboxError> {
        if !ctx.is_origin_call() {
            return Err(InboxError::OriginOnly);
        }
        let data = Self::deposit_payload(dest, ctx.value);
        self.deliver(ctx, bridge, MessageKind::EthDeposit, ctx.sender, data.into(), true)
    }

    /// Submits a retryable ticket funded by the call's native value.
    pub fn create_retryable_ticket(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        ticket: &RetryableTicket,
    ) -> Result<u64, InboxError> {
        let data = ticket.encode(ctx.value);
        self.deliver(ctx, bridge, MessageKind::SubmitRetryable, ctx.sender, data.into(), false)
    }

    fn deposit_payload(dest: Address, value: U256) -> Vec<u8> {
        let mut data = Vec::with_capacity(20 + 32);
        data.extend_from_slice(dest.as_slice());
        data.extend_from_slice(&encoding::u256_word(value));
        data
    }

    fn deliver(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        kind: MessageKind,
        sender: Address,
        data: Bytes,
        from_origin: bool,
    ) -> Result<u64, InboxError> {
        let message_num = bridge.deliver_message_to_inbox(
            &ctx.forward(self.address),
            kind,
            sender,
            keccak256(&data),
        )?;
        debug!(target: "inbox", message_num, ?kind, from_origin, "inbox message delivered");
        self.events.push(if from_origin {
            InboxEvent::InboxMessageDeliveredFromOrigin { message_num }
        } else {
            InboxEvent::InboxMessageDelivered { message_num, data }
        });
        Ok(message_num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BridgeEvent;
    use alloy_primitives::address;

    const OWNER: Address = address!("0x00000000000000000000000000000000000000b0");
    const INBOX_ADDR: Address = address!("0x00000000000000000000000000000000000000b1");
    const USER: Address = address!("0x00000000000000000000000000000000000000b2");
    const CONTRACT: Address = address!("0x00000000000000000000000000000000000000b3");

    fn setup() -> (Inbox, Bridge) {
        let mut bridge = Bridge::new(Address::with_last_byte(0xbb), OWNER);
        bridge.set_inbox(&CallContext::new(OWNER, 1, 1_000), INBOX_ADDR, true).unwrap();
        (Inbox::new(INBOX_ADDR), bridge)
    }

    #[test]
    fn send_l2_message_hashes_payload_into_bridge() {
        let (mut inbox, mut bridge) = setup();
        let ctx = CallContext::new(USER, 10, 10_000);
        let payload = Bytes::from_static(b"l2 transaction");

        let num = inbox.send_l2_message(&ctx, &mut bridge, payload.clone()).unwrap();
        assert_eq!(num, 0);
        assert_eq!(bridge.message_count(), 1);

        let Some(BridgeEvent::MessageDelivered { inbox: via, sender, kind, message_data_hash, .. }) =
            bridge.events().last()
        else {
            panic!("expected delivery event");
        };
        assert_eq!(*via, INBOX_ADDR);
        assert_eq!(*sender, USER);
        assert_eq!(*kind, MessageKind::L2Message);
        assert_eq!(*message_data_hash, keccak256(&payload));

        assert_eq!(
            inbox.events(),
            &[InboxEvent::InboxMessageDelivered { message_num: 0, data: payload }]
        );
    }

    #[test]
    fn from_origin_requires_origin_caller() {
        let (mut inbox, mut bridge) = setup();
        let relayed = CallContext::new(CONTRACT, 10, 10_000).with_origin(USER);
        let err = inbox
            .send_l2_message_from_origin(&relayed, &mut bridge, Bytes::from_static(b"x"))
            .unwrap_err();
        assert_eq!(err, InboxError::OriginOnly);

        let direct = CallContext::new(USER, 10, 10_000);
        let num = inbox
            .send_l2_message_from_origin(&direct, &mut bridge, Bytes::from_static(b"x"))
            .unwrap();
        assert_eq!(inbox.events(), &[InboxEvent::InboxMessageDeliveredFromOrigin {
            message_num: num
        }]);
    }

    #[test]
    fn deposit_eth_packs_dest_and_value() {
        let (mut inbox, mut bridge) = setup();
        let ctx = CallContext::new(USER, 10, 10_000).with_value(U256::from(42));
        inbox.deposit_eth(&ctx, &mut bridge, CONTRACT).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(CONTRACT.as_slice());
        expected.extend_from_slice(&encoding::u256_word(U256::from(42)));

        let Some(BridgeEvent::MessageDelivered { kind, message_data_hash, .. }) =
            bridge.events().last()
        else {
            panic!("expected delivery event");
        };
        assert_eq!(*kind, MessageKind::EthDeposit);
        assert_eq!(*message_data_hash, keccak256(&expected));
    }

    #[test]
    fn retryable_ticket_encoding_is_stable() {
        let ticket = RetryableTicket {
            dest: CONTRACT,
            l2_call_value: U256::from(5),
            max_submission_cost: U256::from(100),
            submission_refund_address: USER,
            value_refund_address: USER,
            max_gas: 1_000_000,
            gas_price: U256::from(2),
            data: Bytes::from_static(b"redeem"),
        };
        let encoded = ticket.encode(U256::from(500));

        assert_eq!(&encoded[..20], CONTRACT.as_slice());
        assert_eq!(encoded.len(), 20 * 3 + 32 * 6 + 6);
        assert_eq!(&encoded[encoded.len() - 6..], b"redeem");

        let (mut inbox, mut bridge) = setup();
        let ctx = CallContext::new(USER, 10, 10_000).with_value(U256::from(500));
        inbox.create_retryable_ticket(&ctx, &mut bridge, &ticket).unwrap();
        let Some(BridgeEvent::MessageDelivered { kind, message_data_hash, .. }) =
            bridge.events().last()
        else {
            panic!("expected delivery event");
        };
        assert_eq!(*kind, MessageKind::SubmitRetryable);
        assert_eq!(*message_data_hash, keccak256(&encoded));
    }
}
