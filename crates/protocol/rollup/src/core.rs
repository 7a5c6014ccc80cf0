//! The rollup's persistent state: node tree, staker registry, zombies, and
//! withdrawable funds.

use crate::{Node, NodeNum, NodeStatus, Staker, Zombie};
use alloy_primitives::{Address, U256, map::HashMap};

/// The state mutated exclusively through the operations on
/// [`Rollup`](crate::Rollup). Unit tests construct fresh instances per test;
/// nothing here is global.
#[derive(Debug)]
pub struct RollupCore {
    nodes: Vec<Node>,
    latest_confirmed: NodeNum,
    first_unresolved: NodeNum,
    stakers: HashMap<Address, Staker>,
    staker_list: Vec<Address>,
    zombies: Vec<Zombie>,
    withdrawable_funds: HashMap<Address, U256>,
}

impl RollupCore {
    /// Creates the state with its confirmed genesis node.
    pub(crate) fn new(genesis: Node) -> Self {
        debug_assert_eq!(genesis.node_num, 0);
        Self {
            nodes: vec![genesis],
            latest_confirmed: 0,
            first_unresolved: 1,
            stakers: HashMap::default(),
            staker_list: Vec::new(),
            zombies: Vec::new(),
            withdrawable_funds: HashMap::default(),
        }
    }

    /// The node at `num`, if it exists.
    pub fn node(&self, num: NodeNum) -> Option<&Node> {
        self.nodes.get(usize::try_from(num).ok()?)
    }

    pub(crate) fn node_mut(&mut self, num: NodeNum) -> Option<&mut Node> {
        self.nodes.get_mut(usize::try_from(num).ok()?)
    }

    /// The most recently confirmed node.
    pub const fn latest_confirmed(&self) -> NodeNum {
        self.latest_confirmed
    }

    /// The oldest node awaiting resolution. May point one past the latest
    /// created node when nothing is unresolved.
    pub const fn first_unresolved_node(&self) -> NodeNum {
        self.first_unresolved
    }

    /// The most recently created node.
    pub fn latest_node_created(&self) -> NodeNum {
        (self.nodes.len() - 1) as NodeNum
    }

    /// The staker record for `address`, if live.
    pub fn staker(&self, address: Address) -> Option<&Staker> {
        self.stakers.get(&address)
    }

    pub(crate) fn staker_mut(&mut self, address: Address) -> Option<&mut Staker> {
        self.stakers.get_mut(&address)
    }

    /// Whether `address` has a live stake.
    pub fn is_staked(&self, address: Address) -> bool {
        self.stakers.get(&address).is_some_and(|staker| staker.is_staked)
    }

    /// The number of live stakers.
    pub fn staker_count(&self) -> u64 {
        self.staker_list.len() as u64
    }

    /// The staker address at `index` in the registry.
    pub fn staker_address(&self, index: usize) -> Option<Address> {
        self.staker_list.get(index).copied()
    }

    /// The number of zombies not yet fully purged.
    pub fn zombie_count(&self) -> u64 {
        self.zombies.len() as u64
    }

    /// The zombie at `index`.
    pub fn zombie(&self, index: u64) -> Option<&Zombie> {
        self.zombies.get(usize::try_from(index).ok()?)
    }

    /// Funds withdrawable by `address`.
    pub fn withdrawable_funds(&self, address: Address) -> U256 {
        self.withdrawable_funds.get(&address).copied().unwrap_or(U256::ZERO)
    }

    /// Zombies still marked on node `num`.
    pub fn count_staked_zombies(&self, num: NodeNum) -> u64 {
        let Some(node) = self.node(num) else { return 0 };
        self.zombies.iter().filter(|zombie| node.has_staker(zombie.staker_address)).count() as u64
    }

    pub(crate) fn add_node(&mut self, node: Node) -> NodeNum {
        let num = node.node_num;
        debug_assert_eq!(num, self.nodes.len() as NodeNum);
        self.nodes.push(node);
        num
    }

    pub(crate) fn create_staker(&mut self, address: Address, amount: U256, node: NodeNum) {
        let staker = Staker {
            address,
            index: self.staker_list.len(),
            latest_staked_node: node,
            amount_staked: amount,
            current_challenge: None,
            is_staked: true,
        };
        self.staker_list.push(address);
        self.stakers.insert(address, staker);
    }

    /// Removes a staker from the registry, swap-filling its list slot.
    pub(crate) fn remove_staker(&mut self, address: Address) {
        let Some(staker) = self.stakers.remove(&address) else { return };
        let last = self.staker_list.len() - 1;
        if staker.index != last {
            let moved = self.staker_list[last];
            self.staker_list.swap(staker.index, last);
            if let Some(moved_staker) = self.stakers.get_mut(&moved) {
                moved_staker.index = staker.index;
            }
        }
        self.staker_list.pop();
    }

    /// Converts a staker into a zombie, preserving its node markings for
    /// later cleanup.
    pub(crate) fn turn_into_zombie(&mut self, address: Address) {
        let Some(staker) = self.stakers.get(&address) else { return };
        let zombie =
            Zombie { staker_address: address, latest_staked_node: staker.latest_staked_node };
        self.remove_staker(address);
        self.zombies.push(zombie);
    }

    pub(crate) fn zombie_mut(&mut self, index: u64) -> Option<&mut Zombie> {
        self.zombies.get_mut(usize::try_from(index).ok()?)
    }

    /// Swap-removes the zombie at `index`.
    pub(crate) fn remove_zombie_entry(&mut self, index: u64) {
        self.zombies.swap_remove(index as usize);
    }

    pub(crate) fn add_withdrawable(&mut self, address: Address, amount: U256) {
        *self.withdrawable_funds.entry(address).or_insert(U256::ZERO) += amount;
    }

    /// Zeroes and returns the withdrawable balance of `address`.
    pub(crate) fn take_withdrawable(&mut self, address: Address) -> U256 {
        self.withdrawable_funds.remove(&address).unwrap_or(U256::ZERO)
    }

    pub(crate) fn set_latest_confirmed(&mut self, num: NodeNum) {
        self.latest_confirmed = num;
    }

    /// Advances the unresolved cursor past the node just resolved and any
    /// destroyed nodes behind it.
    pub(crate) fn advance_first_unresolved(&mut self) {
        self.first_unresolved += 1;
        while let Some(node) = self.node(self.first_unresolved) {
            if node.status != NodeStatus::Destroyed {
                break;
            }
            self.first_unresolved += 1;
        }
    }

    /// Destroys every pending descendant of `root`, returning the range of
    /// destroyed node numbers, if any.
    pub(crate) fn destroy_descendants(&mut self, root: NodeNum) -> Option<(NodeNum, NodeNum)> {
        let latest = self.latest_node_created();
        let mut destroyed: Option<(NodeNum, NodeNum)> = None;
        for num in (root + 1)..=latest {
            let parent = self.nodes[num as usize].parent;
            let parent_dead = matches!(
                self.nodes[parent as usize].status,
                NodeStatus::Rejected | NodeStatus::Destroyed
            );
            if parent_dead && self.nodes[num as usize].status == NodeStatus::Pending {
                self.nodes[num as usize].status = NodeStatus::Destroyed;
                destroyed = Some(match destroyed {
                    None => (num, num),
                    Some((start, _)) => (start, num),
                });
            }
        }
        destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, address, keccak256};

    fn genesis() -> Node {
        let mut node = Node::new(
            0,
            keccak256(b"genesis"),
            0,
            B256::ZERO,
            B256::ZERO,
            B256::ZERO,
            B256::ZERO,
            B256::ZERO,
            0,
            0,
            0,
            B256::ZERO,
            0,
        );
        node.status = NodeStatus::Confirmed;
        node
    }

    fn push_node(core: &mut RollupCore, parent: NodeNum) -> NodeNum {
        let node_num = core.latest_node_created() + 1;
        core.add_node(Node::new(
            node_num,
            keccak256(node_num.to_be_bytes()),
            parent,
            B256::ZERO,
            B256::ZERO,
            B256::ZERO,
            B256::ZERO,
            B256::ZERO,
            0,
            0,
            0,
            B256::ZERO,
            100,
        ))
    }

    #[test]
    fn staker_removal_swap_fills_the_list() {
        let mut core = RollupCore::new(genesis());
        let a = address!("0x00000000000000000000000000000000000000a1");
        let b = address!("0x00000000000000000000000000000000000000a2");
        let c = address!("0x00000000000000000000000000000000000000a3");
        core.create_staker(a, U256::from(1), 0);
        core.create_staker(b, U256::from(2), 0);
        core.create_staker(c, U256::from(3), 0);

        core.remove_staker(b);
        assert_eq!(core.staker_count(), 2);
        assert_eq!(core.staker_address(1), Some(c));
        assert_eq!(core.staker(c).unwrap().index, 1);
        assert!(core.staker(b).is_none());
    }

    #[test]
    fn rejection_destroys_the_whole_subtree() {
        let mut core = RollupCore::new(genesis());
        let n1 = push_node(&mut core, 0);
        let n2 = push_node(&mut core, n1);
        let n3 = push_node(&mut core, n2);
        // A sibling branch survives the rejection.
        let n4 = push_node(&mut core, 0);

        core.node_mut(n1).unwrap().status = NodeStatus::Rejected;
        assert_eq!(core.destroy_descendants(n1), Some((n2, n3)));
        core.advance_first_unresolved();

        assert_eq!(core.node(n2).unwrap().status, NodeStatus::Destroyed);
        assert_eq!(core.node(n3).unwrap().status, NodeStatus::Destroyed);
        assert_eq!(core.node(n4).unwrap().status, NodeStatus::Pending);
        // The cursor skips the destroyed range and lands on the survivor.
        assert_eq!(core.first_unresolved_node(), n4);
    }

    #[test]
    fn staked_zombies_are_counted_per_node() {
        let mut core = RollupCore::new(genesis());
        let n1 = push_node(&mut core, 0);
        let zombie = address!("0x00000000000000000000000000000000000000a4");
        core.node_mut(n1).unwrap().add_staker(zombie);
        core.create_staker(zombie, U256::from(1), n1);
        core.turn_into_zombie(zombie);

        assert_eq!(core.count_staked_zombies(n1), 1);
        assert_eq!(core.count_staked_zombies(0), 0);
        assert_eq!(core.staker_count(), 0);
        assert_eq!(core.zombie_count(), 1);
        assert_eq!(core.zombie(0).unwrap().latest_staked_node, n1);
    }
}
