//! The dispute core of the Arbor protocol.
//!
//! This crate holds the node tree and staking ledger: competing assertions
//! recorded as [`Node`]s, the stakers backing them, confirmation and
//! rejection of the first unresolved node, challenge bookkeeping between
//! conflicting stakers, and zombie cleanup for stake abandoned on losing
//! branches. [`CoreSystem`] assembles the whole deployment — bridge,
//! inboxes, outbox, rollup, and event relay — behind one read-only
//! [`Wiring`] of component addresses.

mod assertion;
pub use assertion::{
    Assertion, ExecutionState, challenge_hash, confirm_data_hash, feed_send_accumulator, node_hash,
};

mod node;
pub use node::{Node, NodeNum, NodeStatus};

mod staker;
pub use staker::{Staker, Zombie};

mod core;
pub use core::RollupCore;

mod rollup;
pub use rollup::{ChallengeArgs, ConfirmArgs, NewNodeArgs, Rollup};

mod challenge;
pub use challenge::{ChallengeFactory, ChallengeParticipant};

mod event_bridge;
pub use event_bridge::RollupEventBridge;

mod events;
pub use events::RollupEvent;

mod errors;
pub use errors::RollupError;

mod system;
pub use system::{CoreSystem, Wiring};

#[cfg(any(test, feature = "test-utils"))]
mod test_utils;
#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::MockChallengeFactory;
