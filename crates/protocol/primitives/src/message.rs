//! Delayed inbox message kinds and hashing.

use crate::encoding::{u256_word, word};
use alloy_primitives::{Address, B256, U256, keccak256};
use thiserror::Error;

/// The kind discriminant carried by every delayed inbox message.
///
/// The discriminant values are part of the wire contract between the
/// settlement side and the executing side and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MessageKind {
    /// A user-submitted L2 transaction payload.
    L2Message = 3,
    /// An L2 call funded by value attached on the settlement side.
    L2FundedByL1 = 7,
    /// A rollup lifecycle event relayed by the event bridge.
    RollupEvent = 8,
    /// A retryable ticket submission.
    SubmitRetryable = 9,
    /// A plain native-asset deposit.
    EthDeposit = 12,
}

/// Error raised when decoding an unknown [`MessageKind`] discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown message kind discriminant: {0}")]
pub struct InvalidMessageKind(pub u8);

impl From<MessageKind> for u8 {
    fn from(kind: MessageKind) -> Self {
        kind as Self
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = InvalidMessageKind;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(Self::L2Message),
            7 => Ok(Self::L2FundedByL1),
            8 => Ok(Self::RollupEvent),
            9 => Ok(Self::SubmitRetryable),
            12 => Ok(Self::EthDeposit),
            other => Err(InvalidMessageKind(other)),
        }
    }
}

/// A message enqueued in the delayed inbox.
///
/// Only the hash of the payload is retained on the settlement side; the full
/// payload travels in calldata and is reconstructed off-chain from the inbox
/// events. The fields here are exactly the preimage of the accumulator entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayedMessage {
    /// The message kind discriminant.
    pub kind: MessageKind,
    /// The account the message is attributed to.
    pub sender: Address,
    /// The block height the message was enqueued at.
    pub block_number: u64,
    /// The block timestamp the message was enqueued at.
    pub block_timestamp: u64,
    /// The message's index in the delayed inbox.
    pub inbox_seq_num: u64,
    /// The gas price paid by the enqueueing transaction.
    pub gas_price_l1: U256,
    /// keccak-256 of the message payload.
    pub data_hash: B256,
}

impl DelayedMessage {
    /// Computes the message hash folded into the delayed accumulator:
    /// `keccak256(kind ‖ sender ‖ block ‖ timestamp ‖ seq ‖ gas_price ‖
    /// data_hash)` with integers packed as 32-byte big-endian words.
    pub fn hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(1 + 20 + 32 * 5);
        buf.push(self.kind.into());
        buf.extend_from_slice(self.sender.as_slice());
        buf.extend_from_slice(&word(self.block_number));
        buf.extend_from_slice(&word(self.block_timestamp));
        buf.extend_from_slice(&word(self.inbox_seq_num));
        buf.extend_from_slice(&u256_word(self.gas_price_l1));
        buf.extend_from_slice(self.data_hash.as_slice());
        keccak256(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use rstest::rstest;

    #[rstest]
    #[case(MessageKind::L2Message, 3)]
    #[case(MessageKind::L2FundedByL1, 7)]
    #[case(MessageKind::RollupEvent, 8)]
    #[case(MessageKind::SubmitRetryable, 9)]
    #[case(MessageKind::EthDeposit, 12)]
    fn kind_discriminants_round_trip(#[case] kind: MessageKind, #[case] raw: u8) {
        assert_eq!(u8::from(kind), raw);
        assert_eq!(MessageKind::try_from(raw), Ok(kind));
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    #[case(255)]
    fn unknown_discriminants_are_rejected(#[case] raw: u8) {
        assert_eq!(MessageKind::try_from(raw), Err(InvalidMessageKind(raw)));
    }

    #[test]
    fn message_hash_covers_every_field() {
        let base = DelayedMessage {
            kind: MessageKind::L2Message,
            sender: address!("0x00000000000000000000000000000000000000aa"),
            block_number: 7,
            block_timestamp: 11,
            inbox_seq_num: 0,
            gas_price_l1: U256::from(13),
            data_hash: keccak256(b"payload"),
        };
        let mut tweaked = base;
        tweaked.inbox_seq_num = 1;
        assert_ne!(base.hash(), tweaked.hash());

        let mut retimed = base;
        retimed.block_timestamp = 12;
        assert_ne!(base.hash(), retimed.hash());
    }
}
