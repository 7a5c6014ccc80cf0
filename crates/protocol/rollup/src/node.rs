//! Nodes of the assertion tree.

use alloy_primitives::{Address, B256, map::HashSet};
use derive_more::Display;

/// Index of a node in the assertion tree. Assigned monotonically and never
/// reused.
pub type NodeNum = u64;

/// Lifecycle state of a node.
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeStatus {
    /// Awaiting confirmation or rejection.
    #[display("pending")]
    Pending,
    /// Won: part of the canonical assertion chain.
    #[display("confirmed")]
    Confirmed,
    /// Lost: rejected as the first unresolved node.
    #[display("rejected")]
    Rejected,
    /// Swept away with a rejected ancestor.
    #[display("destroyed")]
    Destroyed,
}

/// One assertion recorded in the tree.
///
/// A node's staker set contains every staker whose current position is the
/// node or any of its descendants; staking on a child never clears the
/// parent's marking. Zombie stake keeps its markings until walked off by the
/// cleanup operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// The node's index.
    pub node_num: NodeNum,
    /// The node's identity hash, chaining parent linkage and rivalry.
    pub node_hash: B256,
    /// The parent node's index.
    pub parent: NodeNum,
    /// The parent node's identity hash.
    pub parent_node_hash: B256,
    /// Hash of the execution state this node asserts.
    pub state_hash: B256,
    /// Hash of the full assertion (before and after states).
    pub execution_hash: B256,
    /// Commitment a challenge must open with.
    pub challenge_hash: B256,
    /// Commitment confirmation must reproduce from the actual sends and
    /// logs.
    pub confirm_data: B256,
    /// The block the assertion was proposed in.
    pub proposed_block: u64,
    /// Inbox messages consumed by the assertion.
    pub inbox_max_count: u64,
    /// End message count of the sequencer batch the assertion was proven
    /// against.
    pub batch_end_count: u64,
    /// Accumulator of the sequencer batch the assertion was proven against.
    pub batch_acc: B256,
    /// The block after which the node may be confirmed or rejected.
    pub deadline_block: u64,
    /// The most recently created child, if any.
    pub latest_child: Option<NodeNum>,
    /// Lifecycle state.
    pub status: NodeStatus,
    stakers: HashSet<Address>,
}

impl Node {
    /// Creates a pending node with an empty staker set. Callers fill in the
    /// asserter afterwards.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        node_num: NodeNum,
        node_hash: B256,
        parent: NodeNum,
        parent_node_hash: B256,
        state_hash: B256,
        execution_hash: B256,
        challenge_hash: B256,
        confirm_data: B256,
        proposed_block: u64,
        inbox_max_count: u64,
        batch_end_count: u64,
        batch_acc: B256,
        deadline_block: u64,
    ) -> Self {
        Self {
            node_num,
            node_hash,
            parent,
            parent_node_hash,
            state_hash,
            execution_hash,
            challenge_hash,
            confirm_data,
            proposed_block,
            inbox_max_count,
            batch_end_count,
            batch_acc,
            deadline_block,
            latest_child: None,
            status: NodeStatus::Pending,
            stakers: HashSet::default(),
        }
    }

    /// Whether the node is still awaiting resolution.
    pub fn is_pending(&self) -> bool {
        self.status == NodeStatus::Pending
    }

    /// The number of stakers (live or zombie) marked on this node.
    pub fn staker_count(&self) -> u64 {
        self.stakers.len() as u64
    }

    /// Whether `staker` is marked on this node.
    pub fn has_staker(&self, staker: Address) -> bool {
        self.stakers.contains(&staker)
    }

    pub(crate) fn add_staker(&mut self, staker: Address) {
        self.stakers.insert(staker);
    }

    pub(crate) fn remove_staker(&mut self, staker: Address) {
        self.stakers.remove(&staker);
    }
}
