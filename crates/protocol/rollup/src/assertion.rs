//! Assertion states and the hash constructions binding them to nodes.

use alloy_primitives::{B256, keccak256};
use arbor_primitives::{chain_accumulator, encoding::word};

/// A snapshot of the executing side's state at an assertion boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ExecutionState {
    /// The execution machine's state hash.
    pub machine_hash: B256,
    /// Inbox messages fully consumed at this point.
    pub inbox_count: u64,
    /// Outgoing sends issued at this point.
    pub send_count: u64,
    /// Log entries issued at this point.
    pub log_count: u64,
    /// Accumulator over the outgoing sends.
    pub send_acc: B256,
    /// Accumulator over the logs.
    pub log_acc: B256,
}

impl ExecutionState {
    /// The state every deployment starts from: nothing consumed, nothing
    /// emitted.
    pub const fn genesis(machine_hash: B256) -> Self {
        Self {
            machine_hash,
            inbox_count: 0,
            send_count: 0,
            log_count: 0,
            send_acc: B256::ZERO,
            log_acc: B256::ZERO,
        }
    }

    /// Hashes the state: `keccak256(machine_hash ‖ inbox_count ‖ send_count
    /// ‖ log_count ‖ send_acc ‖ log_acc)`.
    pub fn hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(32 * 6);
        buf.extend_from_slice(self.machine_hash.as_slice());
        buf.extend_from_slice(&word(self.inbox_count));
        buf.extend_from_slice(&word(self.send_count));
        buf.extend_from_slice(&word(self.log_count));
        buf.extend_from_slice(self.send_acc.as_slice());
        buf.extend_from_slice(self.log_acc.as_slice());
        keccak256(buf)
    }
}

/// One claimed execution step: the state a staker starts from and the state
/// they assert it reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Assertion {
    /// The state asserted to hold before execution.
    pub before_state: ExecutionState,
    /// The state asserted to hold after execution.
    pub after_state: ExecutionState,
}

impl Assertion {
    /// Hashes the assertion: `keccak256(before ‖ after)` over the state
    /// hashes.
    pub fn execution_hash(&self) -> B256 {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(self.before_state.hash().as_slice());
        buf[32..].copy_from_slice(self.after_state.hash().as_slice());
        keccak256(buf)
    }
}

/// The challenge commitment recorded on a node at creation. A challenge may
/// open only with the preimage of this hash.
pub fn challenge_hash(execution_hash: B256, proposed_block: u64, after_inbox_count: u64) -> B256 {
    let mut buf = Vec::with_capacity(32 * 3);
    buf.extend_from_slice(execution_hash.as_slice());
    buf.extend_from_slice(&word(proposed_block));
    buf.extend_from_slice(&word(after_inbox_count));
    keccak256(buf)
}

/// The confirmation commitment recorded on a node at creation. Confirmation
/// must reproduce this hash from the actual outgoing sends and logs.
pub fn confirm_data_hash(
    before_send_acc: B256,
    after_send_acc: B256,
    after_log_acc: B256,
    after_send_count: u64,
    after_log_count: u64,
) -> B256 {
    let mut buf = Vec::with_capacity(32 * 5);
    buf.extend_from_slice(before_send_acc.as_slice());
    buf.extend_from_slice(after_send_acc.as_slice());
    buf.extend_from_slice(after_log_acc.as_slice());
    buf.extend_from_slice(&word(after_send_count));
    buf.extend_from_slice(&word(after_log_count));
    keccak256(buf)
}

/// The node identity hash. `last_hash` chains siblings: it is the parent's
/// node hash for a first child and the previous sibling's node hash for
/// every later child, so a node's hash commits to the exact rivalry it was
/// created into.
pub fn node_hash(has_sibling: bool, last_hash: B256, execution_hash: B256, inbox_acc: B256) -> B256 {
    let mut buf = Vec::with_capacity(1 + 32 * 3);
    buf.push(has_sibling as u8);
    buf.extend_from_slice(last_hash.as_slice());
    buf.extend_from_slice(execution_hash.as_slice());
    buf.extend_from_slice(inbox_acc.as_slice());
    keccak256(buf)
}

/// Folds one outgoing send into a send accumulator:
/// `keccak256(acc ‖ keccak256(send))`.
pub fn feed_send_accumulator(acc: B256, send: &[u8]) -> B256 {
    chain_accumulator(acc, keccak256(send))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(tag: u8) -> ExecutionState {
        ExecutionState {
            machine_hash: keccak256([tag]),
            inbox_count: tag as u64,
            send_count: 0,
            log_count: 0,
            send_acc: B256::ZERO,
            log_acc: B256::ZERO,
        }
    }

    #[test]
    fn state_hash_covers_counts() {
        let base = state(1);
        let mut bumped = base;
        bumped.send_count = 1;
        assert_ne!(base.hash(), bumped.hash());
    }

    #[test]
    fn execution_hash_orders_states() {
        let forward = Assertion { before_state: state(1), after_state: state(2) };
        let backward = Assertion { before_state: state(2), after_state: state(1) };
        assert_ne!(forward.execution_hash(), backward.execution_hash());
    }

    #[test]
    fn node_hash_distinguishes_first_child_from_rival() {
        let exec = keccak256(b"exec");
        let last = keccak256(b"last");
        let acc = keccak256(b"acc");
        assert_ne!(node_hash(false, last, exec, acc), node_hash(true, last, exec, acc));
    }
}
