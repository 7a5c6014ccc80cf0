//! Test utilities for exercising the rollup state machine.

use crate::{ChallengeFactory, ChallengeParticipant, NodeNum};
use alloy_primitives::Address;

/// A [`ChallengeFactory`] minting deterministic addresses.
#[derive(Debug, Default)]
pub struct MockChallengeFactory {
    created: u8,
}

impl MockChallengeFactory {
    /// Creates a factory whose first challenge lands at
    /// `0xca…00`, the second at `0xca…01`, and so on.
    pub const fn new() -> Self {
        Self { created: 0 }
    }
}

impl ChallengeFactory for MockChallengeFactory {
    fn create_challenge(
        &mut self,
        _asserter: &ChallengeParticipant,
        _challenger: &ChallengeParticipant,
        _challenged_node: NodeNum,
    ) -> Address {
        let mut bytes = [0u8; 20];
        bytes[0] = 0xca;
        bytes[19] = self.created;
        self.created += 1;
        Address::from(bytes)
    }
}
