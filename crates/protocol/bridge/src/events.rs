//! Event payloads emitted by the bridge and inbox.

use alloy_primitives::{Address, B256, Bytes, U256};
use arbor_primitives::MessageKind;

/// Events emitted by the [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", tag = "event"))]
pub enum BridgeEvent {
    /// A message was appended to the delayed accumulator.
    ///
    /// The event carries the accumulator value *before* the append so that
    /// off-chain replay can reconstruct the whole chain from events alone.
    MessageDelivered {
        /// The index assigned to the message.
        message_index: u64,
        /// The accumulator head before this message was folded in.
        before_inbox_acc: B256,
        /// The inbox that delivered the message.
        inbox: Address,
        /// The message kind.
        kind: MessageKind,
        /// The account the message is attributed to.
        sender: Address,
        /// keccak-256 of the message payload.
        message_data_hash: B256,
    },
    /// An authorized outbound call was routed through the bridge.
    BridgeCallTriggered {
        /// The outbox that triggered the call.
        outbox: Address,
        /// The call target.
        dest: Address,
        /// The native value attached.
        amount: U256,
        /// The calldata.
        data: Bytes,
    },
    /// An inbox was added to or removed from the allow-list.
    InboxToggled {
        /// The inbox address.
        inbox: Address,
        /// Whether the inbox is now allow-listed.
        enabled: bool,
    },
    /// An outbox was added to or removed from the allow-list.
    OutboxToggled {
        /// The outbox address.
        outbox: Address,
        /// Whether the outbox is now allow-listed.
        enabled: bool,
    },
}

/// Events emitted by the [`Inbox`](crate::Inbox).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", tag = "event"))]
pub enum InboxEvent {
    /// A message was delivered with its full payload in the event.
    InboxMessageDelivered {
        /// The delayed inbox index assigned to the message.
        message_num: u64,
        /// The full message payload.
        data: Bytes,
    },
    /// A message was delivered by the transaction origin; the payload is
    /// recoverable from calldata, so the event carries only the index.
    InboxMessageDeliveredFromOrigin {
        /// The delayed inbox index assigned to the message.
        message_num: u64,
    },
}
