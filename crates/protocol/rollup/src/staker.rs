//! Stakers and zombies.

use crate::NodeNum;
use alloy_primitives::{Address, U256};

/// A party whose stake backs a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Staker {
    /// The staker's account.
    pub address: Address,
    /// Position in the staker list, maintained under swap-removal.
    pub index: usize,
    /// The deepest node the staker currently backs.
    pub latest_staked_node: NodeNum,
    /// The stake amount posted.
    pub amount_staked: U256,
    /// The challenge the staker is engaged in, if any. A staker is in at
    /// most one challenge at a time.
    pub current_challenge: Option<Address>,
    /// Whether the staker is live.
    pub is_staked: bool,
}

/// A former staker removed from a losing branch whose markings still weigh
/// on the nodes it backed.
///
/// Zombies are purged incrementally: each cleanup call walks a bounded
/// number of nodes up the zombie's branch, unmarking it, until its cursor
/// drops below the first unresolved node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zombie {
    /// The removed staker's account.
    pub staker_address: Address,
    /// The deepest node the zombie is still marked on.
    pub latest_staked_node: NodeNum,
}
