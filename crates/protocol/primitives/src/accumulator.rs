//! The append-only delayed inbox accumulator.

use alloy_primitives::{B256, keccak256};

/// Extends an accumulator head by one message hash:
/// `keccak256(acc ‖ message_hash)`.
pub fn chain_accumulator(acc: B256, message_hash: B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(acc.as_slice());
    buf[32..].copy_from_slice(message_hash.as_slice());
    keccak256(buf)
}

/// An append-only keccak hash chain over delayed inbox messages.
///
/// Entry `i` commits to every message delivered up to and including index
/// `i`; the predecessor of the first entry is the zero hash. The chain makes
/// any reordering or tampering detectable: replaying the message hashes in
/// order is the only way to reproduce the stored array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboxAccumulator {
    accs: Vec<B256>,
}

impl InboxAccumulator {
    /// Creates an empty accumulator.
    pub const fn new() -> Self {
        Self { accs: Vec::new() }
    }

    /// The number of messages folded in so far.
    pub fn count(&self) -> u64 {
        self.accs.len() as u64
    }

    /// The current accumulator head, or the zero hash when empty.
    pub fn head(&self) -> B256 {
        self.accs.last().copied().unwrap_or(B256::ZERO)
    }

    /// The accumulator value after message `index` was folded in.
    pub fn acc_at(&self, index: u64) -> Option<B256> {
        self.accs.get(usize::try_from(index).ok()?).copied()
    }

    /// The full accumulator array.
    pub fn accs(&self) -> &[B256] {
        &self.accs
    }

    /// Folds one message hash into the chain, returning the assigned message
    /// index and the accumulator value that preceded it.
    pub fn append(&mut self, message_hash: B256) -> (u64, B256) {
        let before = self.head();
        let index = self.count();
        self.accs.push(chain_accumulator(before, message_hash));
        (index, before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_accumulator_has_zero_head() {
        let acc = InboxAccumulator::new();
        assert_eq!(acc.count(), 0);
        assert_eq!(acc.head(), B256::ZERO);
        assert_eq!(acc.acc_at(0), None);
    }

    #[test]
    fn append_returns_prior_head() {
        let mut acc = InboxAccumulator::new();
        let (index, before) = acc.append(keccak256(b"first"));
        assert_eq!(index, 0);
        assert_eq!(before, B256::ZERO);

        let head = acc.head();
        let (index, before) = acc.append(keccak256(b"second"));
        assert_eq!(index, 1);
        assert_eq!(before, head);
    }

    fn arb_hash() -> impl Strategy<Value = B256> {
        proptest::array::uniform32(any::<u8>()).prop_map(B256::from)
    }

    proptest! {
        /// The accumulator is a pure fold: replaying the message hashes in
        /// order reproduces the stored array exactly.
        #[test]
        fn replay_reproduces_stored_chain(hashes in proptest::collection::vec(arb_hash(), 0..32)) {
            let mut acc = InboxAccumulator::new();
            for hash in &hashes {
                acc.append(*hash);
            }

            let mut replayed = Vec::with_capacity(hashes.len());
            let mut head = B256::ZERO;
            for hash in &hashes {
                head = chain_accumulator(head, *hash);
                replayed.push(head);
            }

            prop_assert_eq!(acc.accs(), replayed.as_slice());
            prop_assert_eq!(acc.count(), hashes.len() as u64);
        }
    }
}
