//! The seam to the external bisection challenge game.

use crate::NodeNum;
use alloy_primitives::{Address, B256};
use std::fmt::Debug;

/// One side of a challenge: the staker and the assertion commitments they
/// defend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeParticipant {
    /// The staker's account.
    pub staker: Address,
    /// Hash of the assertion the staker defends.
    pub execution_hash: B256,
    /// The block the defended assertion was proposed in.
    pub proposed_block: u64,
    /// Inbox messages the defended assertion consumed.
    pub max_message_count: u64,
}

/// Mints challenge instances.
///
/// The bisection game itself is an external collaborator; the rollup only
/// records the instance's address and later consumes its verdict through
/// [`Rollup::complete_challenge`](crate::Rollup::complete_challenge).
pub trait ChallengeFactory: Debug {
    /// Creates a challenge between `asserter` and `challenger` over
    /// `challenged_node`, returning the instance's address.
    fn create_challenge(
        &mut self,
        asserter: &ChallengeParticipant,
        challenger: &ChallengeParticipant,
        challenged_node: NodeNum,
    ) -> Address;
}
