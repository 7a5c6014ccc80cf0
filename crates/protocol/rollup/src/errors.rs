//! Error types for the rollup state machine.

use crate::NodeNum;
use alloy_primitives::{Address, B256, U256};
use arbor_bridge::BridgeError;
use arbor_outbox::OutboxError;
use arbor_sequencer::SequencerInboxError;
use thiserror::Error;

/// Errors returned by [`Rollup`](crate::Rollup) operations.
///
/// One variant per violated precondition; a failed operation mutates
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollupError {
    /// The caller already has a live stake.
    #[error("{0} is already staked")]
    AlreadyStaked(Address),
    /// The referenced account has no live stake.
    #[error("{0} is not staked")]
    NotStaked(Address),
    /// The staker is engaged in a challenge and cannot act until it
    /// resolves.
    #[error("{0} is in an active challenge")]
    InChallenge(Address),
    /// The staker is not engaged in any challenge.
    #[error("{0} is not in a challenge")]
    NotInChallenge(Address),
    /// The two stakers are engaged in different challenges.
    #[error("stakers are engaged in different challenges")]
    DifferentChallenges,
    /// The caller is not the challenge recorded for these stakers.
    #[error("caller {caller} is not the recorded challenge {expected}")]
    OnlyChallenge {
        /// The challenge the stakers are engaged in.
        expected: Address,
        /// The actual caller.
        caller: Address,
    },
    /// The supplied stake does not meet the current requirement.
    #[error("stake of {provided} is below the required {required}")]
    InsufficientStake {
        /// The stake currently required.
        required: U256,
        /// The stake provided or held.
        provided: U256,
    },
    /// No node exists at the referenced index.
    #[error("no node {0}")]
    UnknownNode(NodeNum),
    /// The referenced node is no longer pending.
    #[error("node {0} is already resolved")]
    NodeAlreadyResolved(NodeNum),
    /// The staker's current node is not the required parent.
    #[error("operation requires staking from node {expected}, but staker is on node {actual}")]
    ParentMismatch {
        /// The parent the operation requires.
        expected: NodeNum,
        /// The node the staker is actually on.
        actual: NodeNum,
    },
    /// The computed node hash does not match the caller's expectation.
    #[error("computed node hash {computed} does not match expected {expected}")]
    NodeHashMismatch {
        /// The hash the caller expected.
        expected: B256,
        /// The hash computed from current state.
        computed: B256,
    },
    /// The assertion's before state does not match the parent node.
    #[error("assertion before-state {computed} does not match parent state {expected}")]
    PreviousStateMismatch {
        /// The parent's recorded state hash.
        expected: B256,
        /// The hash of the supplied before state.
        computed: B256,
    },
    /// The assertion consumes fewer inbox messages than its before state.
    #[error("assertion inbox count regresses from {before} to {after}")]
    InboxCountRegression {
        /// Messages consumed by the before state.
        before: u64,
        /// Messages consumed by the after state.
        after: u64,
    },
    /// The sequencer batch proof did not validate the assertion's inbox
    /// consumption.
    #[error("batch proof rejected: {0}")]
    BatchProof(#[from] SequencerInboxError),
    /// No node is awaiting resolution.
    #[error("no unresolved node")]
    NoUnresolvedNode,
    /// The node's deadline has not passed.
    #[error("deadline block {deadline} has not passed at block {current}")]
    DeadlineNotPassed {
        /// The node's deadline block.
        deadline: u64,
        /// The current block.
        current: u64,
    },
    /// Confirmation requires at least one live staker.
    #[error("no stakers exist")]
    NoStakers,
    /// Not every live staker backs the node up for confirmation.
    #[error("{on_node} stakers on the node but {expected} must back it")]
    NotAllStaked {
        /// Stakers marked on the node.
        on_node: u64,
        /// Live stakers plus staked zombies that must be marked.
        expected: u64,
    },
    /// The supplied sends do not reproduce the node's confirmation
    /// commitment.
    #[error("confirm data {computed} does not match node commitment {expected}")]
    ConfirmDataMismatch {
        /// The commitment recorded at node creation.
        expected: B256,
        /// The hash recomputed from the supplied sends.
        computed: B256,
    },
    /// The rejection witness is staked on the node under rejection.
    #[error("witness {0} is staked on the node under rejection")]
    StakedOnTarget(Address),
    /// The node still has live (non-zombie) backers.
    #[error("node still has {0} live stakers")]
    HasStakers(u64),
    /// Challenge nodes must be supplied in creation order.
    #[error("challenge nodes must be ordered oldest first")]
    WrongNodeOrder,
    /// The two challenge nodes are not siblings.
    #[error("nodes have different parents {parent1} and {parent2}")]
    NotSiblings {
        /// Parent of the first node.
        parent1: NodeNum,
        /// Parent of the second node.
        parent2: NodeNum,
    },
    /// The staker does not back the node they are challenged over.
    #[error("{staker} is not staked on node {node}")]
    NotStakedOnNode {
        /// The staker.
        staker: Address,
        /// The node they must back.
        node: NodeNum,
    },
    /// The supplied challenge preimage does not open the node's commitment.
    #[error("challenge preimage does not match node {0}")]
    ChallengeHashMismatch(NodeNum),
    /// No zombie exists at the referenced index.
    #[error("no zombie {0}")]
    NoSuchZombie(u64),
    /// The stake still backs an unresolved node and cannot be returned.
    #[error("stake still backs unresolved node {0}")]
    StakeActive(NodeNum),
    /// The stake cannot be reduced below the current requirement.
    #[error("stake of {amount} cannot be reduced below the required {required}")]
    StakeTooLow {
        /// The stake held.
        amount: U256,
        /// The stake currently required.
        required: U256,
    },
    /// The caller is not the rollup.
    #[error("caller {0} is not the rollup")]
    OnlyRollup(Address),
    /// The bridge rejected a relayed message.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    /// The outbox rejected the confirmed sends.
    #[error(transparent)]
    Outbox(#[from] OutboxError),
}
