//! Event payloads emitted by the rollup.

use crate::NodeNum;
use alloy_primitives::{Address, B256};

/// Events emitted by the [`Rollup`](crate::Rollup).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", tag = "event"))]
pub enum RollupEvent {
    /// A new assertion was recorded.
    NodeCreated {
        /// The node's index.
        node_num: NodeNum,
        /// The parent node's identity hash.
        parent_node_hash: B256,
        /// The node's identity hash.
        node_hash: B256,
        /// Hash of the full assertion.
        execution_hash: B256,
        /// Inbox messages consumed by the assertion.
        inbox_max_count: u64,
        /// End message count of the batch the assertion was proven against.
        batch_end_count: u64,
        /// Accumulator of the batch the assertion was proven against.
        batch_acc: B256,
        /// The staker that created the node.
        asserter: Address,
    },
    /// The first unresolved node was confirmed.
    NodeConfirmed {
        /// The confirmed node's index.
        node_num: NodeNum,
        /// The send accumulator after the node's sends.
        after_send_acc: B256,
        /// The send count after the node's sends.
        after_send_count: u64,
        /// The log accumulator after the node's logs.
        after_log_acc: B256,
        /// The log count after the node's logs.
        after_log_count: u64,
    },
    /// The first unresolved node was rejected.
    NodeRejected {
        /// The rejected node's index.
        node_num: NodeNum,
    },
    /// A range of nodes was destroyed with a rejected ancestor.
    NodesDestroyed {
        /// The first destroyed node.
        start_node: NodeNum,
        /// The last destroyed node.
        end_node: NodeNum,
    },
    /// A staker moved onto an existing node.
    StakerReassigned {
        /// The staker.
        staker: Address,
        /// The node now backed.
        new_node: NodeNum,
    },
    /// A challenge opened between two stakers on conflicting nodes.
    RollupChallengeStarted {
        /// The challenge instance.
        challenge_contract: Address,
        /// The staker backing the older node.
        asserter: Address,
        /// The staker backing the newer node.
        challenger: Address,
        /// The node under dispute.
        challenged_node: NodeNum,
    },
}
