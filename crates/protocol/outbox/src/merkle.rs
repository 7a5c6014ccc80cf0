//! Merkle tree construction and proof verification.
//!
//! The hash construction here is the bit-exact contract between the
//! settlement side and the execution side: the executing side builds the
//! same tree over a confirmed batch's sends when it produces the root the
//! rollup later seeds into an outbox entry.

use alloy_primitives::{B256, keccak256};
use thiserror::Error;

/// Upper bound on proof length, capping verification cost.
pub const MAX_PROOF_LENGTH: usize = 256;

/// Errors returned by proof verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MerkleError {
    /// The proof exceeds [`MAX_PROOF_LENGTH`] siblings.
    #[error("proof of {0} siblings exceeds the maximum of {MAX_PROOF_LENGTH}")]
    ProofTooLong(usize),
    /// The path has set bits beyond the proof's depth.
    #[error("path {path} is not minimal for a proof of {levels} levels")]
    PathNotMinimal {
        /// The claimed leaf path.
        path: u64,
        /// The number of proof levels supplied.
        levels: usize,
    },
}

fn hash_pair(left: B256, right: B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_slice());
    buf[32..].copy_from_slice(right.as_slice());
    keccak256(buf)
}

/// Computes the root of the tree over `leaves`, padding the leaf layer to
/// the next power of two with zero leaves. An empty batch has the zero root.
pub fn generate_root(leaves: &[B256]) -> B256 {
    if leaves.is_empty() {
        return B256::ZERO;
    }
    let mut layer = leaves.to_vec();
    layer.resize(leaves.len().next_power_of_two(), B256::ZERO);
    while layer.len() > 1 {
        layer = layer.chunks(2).map(|pair| hash_pair(pair[0], pair[1])).collect();
    }
    layer[0]
}

/// Produces the sibling path proving `index` within `leaves`, bottom-up.
/// Returns `None` when the index is out of range.
pub fn generate_proof(leaves: &[B256], index: usize) -> Option<Vec<B256>> {
    if index >= leaves.len() {
        return None;
    }
    let mut layer = leaves.to_vec();
    layer.resize(leaves.len().next_power_of_two(), B256::ZERO);

    let mut proof = Vec::new();
    let mut position = index;
    while layer.len() > 1 {
        proof.push(layer[position ^ 1]);
        layer = layer.chunks(2).map(|pair| hash_pair(pair[0], pair[1])).collect();
        position /= 2;
    }
    Some(proof)
}

/// Recomputes the root committed to by `proof` for `item` at leaf position
/// `path`. Bit `i` of the path selects the side at level `i`: a zero bit
/// keeps the running hash on the left.
pub fn calculate_merkle_root(proof: &[B256], path: u64, item: B256) -> Result<B256, MerkleError> {
    if proof.len() > MAX_PROOF_LENGTH {
        return Err(MerkleError::ProofTooLong(proof.len()));
    }
    if proof.len() < 64 && path >> proof.len() != 0 {
        return Err(MerkleError::PathNotMinimal { path, levels: proof.len() });
    }

    let mut node = item;
    for (level, sibling) in proof.iter().enumerate() {
        node = if (path >> level) & 1 == 0 {
            hash_pair(node, *sibling)
        } else {
            hash_pair(*sibling, node)
        };
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn leaf(tag: u8) -> B256 {
        keccak256([tag])
    }

    #[test]
    fn four_leaf_tree_matches_manual_hashing() {
        let leaves = [leaf(0), leaf(1), leaf(2), leaf(3)];
        let expected =
            hash_pair(hash_pair(leaves[0], leaves[1]), hash_pair(leaves[2], leaves[3]));
        assert_eq!(generate_root(&leaves), expected);

        let proof = generate_proof(&leaves, 2).unwrap();
        assert_eq!(proof, vec![leaves[3], hash_pair(leaves[0], leaves[1])]);
        assert_eq!(calculate_merkle_root(&proof, 2, leaves[2]), Ok(expected));
    }

    #[test]
    fn odd_leaf_counts_are_zero_padded() {
        let leaves = [leaf(0), leaf(1), leaf(2)];
        let expected =
            hash_pair(hash_pair(leaves[0], leaves[1]), hash_pair(leaves[2], B256::ZERO));
        assert_eq!(generate_root(&leaves), expected);
    }

    #[test]
    fn non_minimal_paths_are_rejected() {
        let leaves = [leaf(0), leaf(1)];
        let proof = generate_proof(&leaves, 0).unwrap();
        assert_eq!(
            calculate_merkle_root(&proof, 2, leaves[0]),
            Err(MerkleError::PathNotMinimal { path: 2, levels: 1 })
        );
    }

    #[test]
    fn oversized_proofs_are_rejected() {
        let proof = vec![B256::ZERO; MAX_PROOF_LENGTH + 1];
        assert_eq!(
            calculate_merkle_root(&proof, 0, leaf(0)),
            Err(MerkleError::ProofTooLong(MAX_PROOF_LENGTH + 1))
        );
    }

    fn arb_leaves() -> impl Strategy<Value = Vec<B256>> {
        proptest::collection::vec(
            proptest::array::uniform32(any::<u8>()).prop_map(B256::from),
            1..24,
        )
    }

    proptest! {
        /// Every leaf proves against the root it was included under.
        #[test]
        fn proofs_round_trip(leaves in arb_leaves(), seed in any::<proptest::sample::Index>()) {
            let index = seed.index(leaves.len());
            let root = generate_root(&leaves);
            let proof = generate_proof(&leaves, index).unwrap();
            prop_assert_eq!(
                calculate_merkle_root(&proof, index as u64, leaves[index]),
                Ok(root)
            );
        }

        /// A proof for one leaf never validates another.
        #[test]
        fn proofs_do_not_transfer(leaves in arb_leaves(), seed in any::<proptest::sample::Index>()) {
            prop_assume!(leaves.len() > 1);
            let index = seed.index(leaves.len());
            let other = (index + 1) % leaves.len();
            prop_assume!(leaves[index] != leaves[other]);

            let root = generate_root(&leaves);
            let proof = generate_proof(&leaves, index).unwrap();
            prop_assert_ne!(
                calculate_merkle_root(&proof, index as u64, leaves[other]),
                Ok(root)
            );
        }
    }
}
