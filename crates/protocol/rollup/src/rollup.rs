//! The rollup operations: staking, assertion, resolution, challenges, and
//! zombie cleanup.

use crate::{
    Assertion, ChallengeFactory, ChallengeParticipant, Node, NodeNum, NodeStatus, RollupCore,
    RollupError, RollupEvent, RollupEventBridge, challenge_hash, confirm_data_hash,
    feed_send_accumulator, node_hash,
};
use alloy_primitives::{Address, B256, Bytes, U256};
use arbor_bridge::Bridge;
use arbor_outbox::{Outbox, split_sends};
use arbor_primitives::{CallContext, CoreConfig};
use arbor_sequencer::SequencerInbox;
use tracing::{debug, info};

/// Arguments to [`Rollup::stake_on_new_node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNodeArgs {
    /// The node hash the staker expects to create. Guards against a
    /// reorganized tree silently changing what the stake backs.
    pub expected_node_hash: B256,
    /// The asserted execution step.
    pub assertion: Assertion,
    /// The node the assertion builds on; must be the staker's current node.
    pub prev_node_num: NodeNum,
    /// The sealed sequencer batch the assertion's inbox consumption is
    /// proven against.
    pub batch_index: u64,
}

/// Arguments to [`Rollup::confirm_next_node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmArgs {
    /// The send accumulator before the node's sends.
    pub before_send_acc: B256,
    /// The node's outgoing sends, concatenated.
    pub sends_data: Bytes,
    /// The byte length of each send within `sends_data`.
    pub send_lengths: Vec<u64>,
    /// The send count after the node's sends.
    pub after_send_count: u64,
    /// The log accumulator after the node's logs.
    pub after_log_acc: B256,
    /// The log count after the node's logs.
    pub after_log_count: u64,
}

/// Arguments to [`Rollup::create_challenge`]: two stakers on conflicting
/// sibling nodes and the preimages of both nodes' challenge commitments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeArgs {
    /// The stakers, oldest-node first.
    pub stakers: [Address; 2],
    /// The conflicting sibling nodes, in creation order.
    pub node_nums: [NodeNum; 2],
    /// Each node's asserted execution hash.
    pub execution_hashes: [B256; 2],
    /// Each node's proposal block.
    pub proposed_blocks: [u64; 2],
    /// Each node's consumed inbox message count.
    pub max_message_counts: [u64; 2],
}

/// The dispute state machine.
///
/// Holds the [`RollupCore`] state and implements every transition over it.
/// Collaborators (bridge, sequencer inbox, outbox, event relay) are passed
/// in per call; the ledger's serial transaction order is the only
/// synchronization.
#[derive(Debug)]
pub struct Rollup {
    address: Address,
    config: CoreConfig,
    core: RollupCore,
    challenge_factory: Box<dyn ChallengeFactory>,
    events: Vec<RollupEvent>,
}

impl Rollup {
    /// Creates the rollup with its confirmed genesis node.
    pub fn new(
        address: Address,
        config: CoreConfig,
        challenge_factory: Box<dyn ChallengeFactory>,
    ) -> Self {
        let genesis_state = crate::ExecutionState::genesis(config.genesis_machine_hash);
        let genesis_assertion =
            Assertion { before_state: genesis_state, after_state: genesis_state };
        let execution_hash = genesis_assertion.execution_hash();
        let mut genesis = Node::new(
            0,
            node_hash(false, B256::ZERO, execution_hash, B256::ZERO),
            0,
            B256::ZERO,
            genesis_state.hash(),
            execution_hash,
            B256::ZERO,
            B256::ZERO,
            0,
            0,
            0,
            B256::ZERO,
            0,
        );
        genesis.status = NodeStatus::Confirmed;
        Self {
            address,
            config,
            core: RollupCore::new(genesis),
            challenge_factory,
            events: Vec::new(),
        }
    }

    /// The rollup's own address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The deployment parameters.
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// The rollup state.
    pub const fn core(&self) -> &RollupCore {
        &self.core
    }

    /// The node at `num`, if it exists.
    pub fn node(&self, num: NodeNum) -> Option<&Node> {
        self.core.node(num)
    }

    /// The most recently confirmed node.
    pub const fn latest_confirmed(&self) -> NodeNum {
        self.core.latest_confirmed()
    }

    /// The oldest node awaiting resolution.
    pub const fn first_unresolved_node(&self) -> NodeNum {
        self.core.first_unresolved_node()
    }

    /// Events emitted so far, in order.
    pub fn events(&self) -> &[RollupEvent] {
        &self.events
    }

    /// The stake required of a new assertion at `block_number`.
    ///
    /// Base stake while nothing is overdue; once the first unresolved node's
    /// deadline has passed, the requirement doubles per elapsed confirmation
    /// period, saturating. The curve discourages spam assertions while a
    /// dispute is pending and is monotonically non-decreasing in the block
    /// number.
    pub fn required_stake(
        &self,
        block_number: u64,
        first_unresolved: NodeNum,
        latest_created: NodeNum,
    ) -> U256 {
        if first_unresolved > latest_created {
            return self.config.base_stake;
        }
        let Some(node) = self.core.node(first_unresolved) else {
            return self.config.base_stake;
        };
        if block_number < node.deadline_block {
            return self.config.base_stake;
        }
        let periods = (block_number - node.deadline_block) / self.config.confirm_period_blocks.max(1);
        let mut required = self.config.base_stake;
        for _ in 0..periods.min(256) {
            match required.checked_mul(U256::from(2)) {
                Some(doubled) => required = doubled,
                None => return U256::MAX,
            }
        }
        required
    }

    /// The stake currently required of a new assertion.
    pub fn current_required_stake(&self, ctx: &CallContext) -> U256 {
        self.required_stake(
            ctx.block_number,
            self.core.first_unresolved_node(),
            self.core.latest_node_created(),
        )
    }

    /// Creates a stake for the caller on the latest confirmed node.
    ///
    /// The deposit is the call's value and must reach the current
    /// requirement.
    pub fn new_stake(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        event_bridge: &mut RollupEventBridge,
    ) -> Result<(), RollupError> {
        if self.core.is_staked(ctx.sender) {
            return Err(RollupError::AlreadyStaked(ctx.sender));
        }
        let required = self.current_required_stake(ctx);
        if ctx.value < required {
            return Err(RollupError::InsufficientStake { required, provided: ctx.value });
        }
        let latest_confirmed = self.core.latest_confirmed();
        event_bridge.stake_created(
            &ctx.forward(self.address),
            bridge,
            ctx.sender,
            latest_confirmed,
        )?;
        self.core.create_staker(ctx.sender, ctx.value, latest_confirmed);
        info!(
            target: "rollup",
            staker = %ctx.sender,
            amount = %ctx.value,
            node = latest_confirmed,
            "stake created",
        );
        Ok(())
    }

    /// Moves the caller's stake onto an existing unresolved node whose
    /// parent is the caller's current node.
    pub fn stake_on_existing_node(
        &mut self,
        ctx: &CallContext,
        node_num: NodeNum,
        expected_node_hash: B256,
    ) -> Result<(), RollupError> {
        let staker = self.require_unchallenged_staker(ctx.sender)?;
        let staked_on = staker.latest_staked_node;

        let node = self.core.node(node_num).ok_or(RollupError::UnknownNode(node_num))?;
        if !node.is_pending() {
            return Err(RollupError::NodeAlreadyResolved(node_num));
        }
        if node.node_hash != expected_node_hash {
            return Err(RollupError::NodeHashMismatch {
                expected: expected_node_hash,
                computed: node.node_hash,
            });
        }
        if node.parent != staked_on {
            return Err(RollupError::ParentMismatch { expected: node.parent, actual: staked_on });
        }

        self.stake_on_node(ctx.sender, node_num);
        self.events.push(RollupEvent::StakerReassigned { staker: ctx.sender, new_node: node_num });
        debug!(target: "rollup", staker = %ctx.sender, node = node_num, "staker reassigned");
        Ok(())
    }

    /// Creates a new node asserting one execution step off the caller's
    /// current node and moves the caller's stake onto it.
    pub fn stake_on_new_node(
        &mut self,
        ctx: &CallContext,
        sequencer_inbox: &SequencerInbox,
        bridge: &mut Bridge,
        event_bridge: &mut RollupEventBridge,
        args: &NewNodeArgs,
    ) -> Result<NodeNum, RollupError> {
        let staker = self.require_unchallenged_staker(ctx.sender)?;
        let staked_on = staker.latest_staked_node;
        let amount_staked = staker.amount_staked;
        if staked_on != args.prev_node_num {
            return Err(RollupError::ParentMismatch {
                expected: args.prev_node_num,
                actual: staked_on,
            });
        }

        let prev =
            self.core.node(args.prev_node_num).ok_or(RollupError::UnknownNode(args.prev_node_num))?;
        let prev_stakeable = prev.is_pending()
            || (prev.status == NodeStatus::Confirmed
                && args.prev_node_num == self.core.latest_confirmed());
        if !prev_stakeable {
            return Err(RollupError::NodeAlreadyResolved(args.prev_node_num));
        }

        let before = args.assertion.before_state;
        let after = args.assertion.after_state;
        if before.hash() != prev.state_hash {
            return Err(RollupError::PreviousStateMismatch {
                expected: prev.state_hash,
                computed: before.hash(),
            });
        }
        if after.inbox_count < before.inbox_count {
            return Err(RollupError::InboxCountRegression {
                before: before.inbox_count,
                after: after.inbox_count,
            });
        }

        // The assertion may only consume messages the sequencer inbox has
        // actually accepted, proven against a sealed batch.
        let (batch_end_count, batch_acc) = sequencer_inbox
            .prove_batch_contains_sequence_number(args.batch_index, after.inbox_count)?;

        let required = self.current_required_stake(ctx);
        if amount_staked < required {
            return Err(RollupError::InsufficientStake { required, provided: amount_staked });
        }

        let has_sibling = prev.latest_child.is_some();
        let last_hash = match prev.latest_child {
            Some(sibling) => {
                self.core.node(sibling).ok_or(RollupError::UnknownNode(sibling))?.node_hash
            }
            None => prev.node_hash,
        };
        let execution_hash = args.assertion.execution_hash();
        let computed_node_hash = node_hash(has_sibling, last_hash, execution_hash, batch_acc);
        if computed_node_hash != args.expected_node_hash {
            return Err(RollupError::NodeHashMismatch {
                expected: args.expected_node_hash,
                computed: computed_node_hash,
            });
        }

        let mut deadline_block =
            ctx.block_number.max(prev.deadline_block) + self.config.confirm_period_blocks;
        if has_sibling {
            deadline_block += self.config.extra_challenge_time_blocks;
        }

        let node_num = self.core.latest_node_created() + 1;
        let parent_node_hash = prev.node_hash;
        event_bridge.node_created(
            &ctx.forward(self.address),
            bridge,
            node_num,
            args.prev_node_num,
            deadline_block,
            ctx.sender,
        )?;

        let node = Node::new(
            node_num,
            computed_node_hash,
            args.prev_node_num,
            parent_node_hash,
            after.hash(),
            execution_hash,
            challenge_hash(execution_hash, ctx.block_number, after.inbox_count),
            confirm_data_hash(
                before.send_acc,
                after.send_acc,
                after.log_acc,
                after.send_count,
                after.log_count,
            ),
            ctx.block_number,
            after.inbox_count,
            batch_end_count,
            batch_acc,
            deadline_block,
        );
        self.core.add_node(node);
        if let Some(prev) = self.core.node_mut(args.prev_node_num) {
            prev.latest_child = Some(node_num);
        }
        self.stake_on_node(ctx.sender, node_num);

        info!(
            target: "rollup",
            node = node_num,
            parent = args.prev_node_num,
            deadline = deadline_block,
            asserter = %ctx.sender,
            "node created",
        );
        self.events.push(RollupEvent::NodeCreated {
            node_num,
            parent_node_hash,
            node_hash: computed_node_hash,
            execution_hash,
            inbox_max_count: after.inbox_count,
            batch_end_count,
            batch_acc,
            asserter: ctx.sender,
        });
        Ok(node_num)
    }

    /// Confirms the first unresolved node once its deadline has passed and
    /// every live staker backs it, seeding the outbox from its sends.
    pub fn confirm_next_node(
        &mut self,
        ctx: &CallContext,
        outbox: &mut Outbox,
        bridge: &mut Bridge,
        event_bridge: &mut RollupEventBridge,
        args: &ConfirmArgs,
    ) -> Result<(), RollupError> {
        let first = self.require_first_unresolved()?;
        let node = self.core.node(first).ok_or(RollupError::UnknownNode(first))?;
        let deadline_block = node.deadline_block;
        let confirm_data = node.confirm_data;
        if ctx.block_number <= deadline_block {
            return Err(RollupError::DeadlineNotPassed {
                deadline: deadline_block,
                current: ctx.block_number,
            });
        }

        self.sweep_old_zombies(0);

        let live_stakers = self.core.staker_count();
        if live_stakers == 0 {
            return Err(RollupError::NoStakers);
        }
        let staked_zombies = self.core.count_staked_zombies(first);
        let on_node =
            self.core.node(first).map(Node::staker_count).unwrap_or_default();
        if on_node != live_stakers + staked_zombies {
            return Err(RollupError::NotAllStaked {
                on_node,
                expected: live_stakers + staked_zombies,
            });
        }

        // The supplied sends must reproduce the commitment made at node
        // creation.
        let sends = split_sends(&args.sends_data, &args.send_lengths)?;
        let mut after_send_acc = args.before_send_acc;
        for send in &sends {
            after_send_acc = feed_send_accumulator(after_send_acc, send);
        }
        let computed = confirm_data_hash(
            args.before_send_acc,
            after_send_acc,
            args.after_log_acc,
            args.after_send_count,
            args.after_log_count,
        );
        if computed != confirm_data {
            return Err(RollupError::ConfirmDataMismatch { expected: confirm_data, computed });
        }

        event_bridge.node_confirmed(&ctx.forward(self.address), bridge, first)?;
        outbox.process_outgoing_messages(
            &ctx.forward(self.address),
            &args.sends_data,
            &args.send_lengths,
        )?;

        if let Some(node) = self.core.node_mut(first) {
            node.status = NodeStatus::Confirmed;
        }
        self.core.set_latest_confirmed(first);
        self.core.advance_first_unresolved();

        info!(target: "rollup", node = first, "node confirmed");
        self.events.push(RollupEvent::NodeConfirmed {
            node_num: first,
            after_send_acc,
            after_send_count: args.after_send_count,
            after_log_acc: args.after_log_acc,
            after_log_count: args.after_log_count,
        });
        Ok(())
    }

    /// Rejects the first unresolved node.
    ///
    /// When the node extends the latest confirmed node, rejection requires a
    /// witness staker on a competing unresolved branch, a passed deadline,
    /// and no live backer. When the node's parent has already lost, nothing
    /// further needs proving. Rejection destroys the node's descendants.
    pub fn reject_next_node(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        event_bridge: &mut RollupEventBridge,
        staker_witness: Address,
    ) -> Result<(), RollupError> {
        let first = self.require_first_unresolved()?;
        let node = self.core.node(first).ok_or(RollupError::UnknownNode(first))?;
        let deadline_block = node.deadline_block;

        if node.parent == self.core.latest_confirmed() {
            let witness = self
                .core
                .staker(staker_witness)
                .filter(|staker| staker.is_staked)
                .ok_or(RollupError::NotStaked(staker_witness))?;
            // A live stake on another unresolved branch proves this node is
            // not the only candidate; rejection cannot orphan the chain.
            let witness_node = witness.latest_staked_node;
            if !self.core.node(witness_node).is_some_and(Node::is_pending) {
                return Err(RollupError::NodeAlreadyResolved(witness_node));
            }
            let node = self.core.node(first).ok_or(RollupError::UnknownNode(first))?;
            if node.has_staker(staker_witness) {
                return Err(RollupError::StakedOnTarget(staker_witness));
            }
            if ctx.block_number <= deadline_block {
                return Err(RollupError::DeadlineNotPassed {
                    deadline: deadline_block,
                    current: ctx.block_number,
                });
            }

            self.sweep_old_zombies(0);

            let staked_zombies = self.core.count_staked_zombies(first);
            let on_node =
                self.core.node(first).map(Node::staker_count).unwrap_or_default();
            if on_node != staked_zombies {
                return Err(RollupError::HasStakers(on_node - staked_zombies));
            }
        }

        event_bridge.node_rejected(&ctx.forward(self.address), bridge, first)?;

        if let Some(node) = self.core.node_mut(first) {
            node.status = NodeStatus::Rejected;
        }
        let destroyed = self.core.destroy_descendants(first);
        self.core.advance_first_unresolved();

        info!(target: "rollup", node = first, "node rejected");
        self.events.push(RollupEvent::NodeRejected { node_num: first });
        if let Some((start_node, end_node)) = destroyed {
            self.events.push(RollupEvent::NodesDestroyed { start_node, end_node });
        }
        Ok(())
    }

    /// Opens a challenge between two stakers backing conflicting sibling
    /// nodes.
    pub fn create_challenge(
        &mut self,
        ctx: &CallContext,
        args: &ChallengeArgs,
    ) -> Result<Address, RollupError> {
        if args.node_nums[0] >= args.node_nums[1] {
            return Err(RollupError::WrongNodeOrder);
        }
        let node1 =
            self.core.node(args.node_nums[0]).ok_or(RollupError::UnknownNode(args.node_nums[0]))?;
        let node2 =
            self.core.node(args.node_nums[1]).ok_or(RollupError::UnknownNode(args.node_nums[1]))?;
        if !node1.is_pending() {
            return Err(RollupError::NodeAlreadyResolved(args.node_nums[0]));
        }
        if !node2.is_pending() {
            return Err(RollupError::NodeAlreadyResolved(args.node_nums[1]));
        }
        if node1.parent != node2.parent {
            return Err(RollupError::NotSiblings { parent1: node1.parent, parent2: node2.parent });
        }

        for (staker, node, node_num) in [
            (args.stakers[0], node1, args.node_nums[0]),
            (args.stakers[1], node2, args.node_nums[1]),
        ] {
            let record = self
                .core
                .staker(staker)
                .filter(|record| record.is_staked)
                .ok_or(RollupError::NotStaked(staker))?;
            if record.current_challenge.is_some() {
                return Err(RollupError::InChallenge(staker));
            }
            if !node.has_staker(staker) {
                return Err(RollupError::NotStakedOnNode { staker, node: node_num });
            }
        }
        for (i, node) in [node1, node2].into_iter().enumerate() {
            let opened = challenge_hash(
                args.execution_hashes[i],
                args.proposed_blocks[i],
                args.max_message_counts[i],
            );
            if opened != node.challenge_hash {
                return Err(RollupError::ChallengeHashMismatch(node.node_num));
            }
        }

        let asserter = ChallengeParticipant {
            staker: args.stakers[0],
            execution_hash: args.execution_hashes[0],
            proposed_block: args.proposed_blocks[0],
            max_message_count: args.max_message_counts[0],
        };
        let challenger = ChallengeParticipant {
            staker: args.stakers[1],
            execution_hash: args.execution_hashes[1],
            proposed_block: args.proposed_blocks[1],
            max_message_count: args.max_message_counts[1],
        };
        let challenge_contract =
            self.challenge_factory.create_challenge(&asserter, &challenger, args.node_nums[0]);

        for staker in args.stakers {
            if let Some(record) = self.core.staker_mut(staker) {
                record.current_challenge = Some(challenge_contract);
            }
        }

        info!(
            target: "rollup",
            challenge = %challenge_contract,
            asserter = %args.stakers[0],
            challenger = %args.stakers[1],
            challenged_node = args.node_nums[0],
            caller = %ctx.sender,
            "challenge started",
        );
        self.events.push(RollupEvent::RollupChallengeStarted {
            challenge_contract,
            asserter: args.stakers[0],
            challenger: args.stakers[1],
            challenged_node: args.node_nums[0],
        });
        Ok(challenge_contract)
    }

    /// Consumes a challenge verdict. Callable only by the challenge instance
    /// both stakers are engaged in.
    ///
    /// The loser's stake is capped to the winner's; the winner takes half of
    /// what remains, the rest accrues to the owner; any excess above the cap
    /// returns to the loser. The loser becomes a zombie so its markings can
    /// still be walked off competing branches.
    pub fn complete_challenge(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        event_bridge: &mut RollupEventBridge,
        winning_staker: Address,
        losing_staker: Address,
    ) -> Result<(), RollupError> {
        let winner =
            self.core.staker(winning_staker).ok_or(RollupError::NotStaked(winning_staker))?;
        let loser = self.core.staker(losing_staker).ok_or(RollupError::NotStaked(losing_staker))?;
        let challenge =
            winner.current_challenge.ok_or(RollupError::NotInChallenge(winning_staker))?;
        if loser.current_challenge != Some(challenge) {
            return Err(RollupError::DifferentChallenges);
        }
        if ctx.sender != challenge {
            return Err(RollupError::OnlyChallenge { expected: challenge, caller: ctx.sender });
        }

        let winner_amount = winner.amount_staked;
        let winner_node = winner.latest_staked_node;
        let mut remaining = loser.amount_staked;
        if remaining > winner_amount {
            self.core.add_withdrawable(losing_staker, remaining - winner_amount);
            remaining = winner_amount;
        }
        let amount_won = remaining / U256::from(2);

        event_bridge.node_claimed(
            &ctx.forward(self.address),
            bridge,
            winner_node,
            winning_staker,
        )?;

        if let Some(winner) = self.core.staker_mut(winning_staker) {
            winner.amount_staked += amount_won;
            winner.current_challenge = None;
        }
        self.core.add_withdrawable(self.config.owner, remaining - amount_won);
        if let Some(loser) = self.core.staker_mut(losing_staker) {
            loser.amount_staked = U256::ZERO;
            loser.current_challenge = None;
        }
        self.core.turn_into_zombie(losing_staker);

        info!(
            target: "rollup",
            winner = %winning_staker,
            loser = %losing_staker,
            %challenge,
            amount_won = %amount_won,
            "challenge completed",
        );
        Ok(())
    }

    /// Walks up to `max_nodes` nodes of a zombie's branch, unmarking its
    /// stake, and drops the zombie once its cursor falls below the first
    /// unresolved node. Iteration is caller-bounded so one call never does
    /// unbounded work.
    pub fn remove_zombie(&mut self, zombie_num: u64, max_nodes: u64) -> Result<(), RollupError> {
        let zombie = *self.core.zombie(zombie_num).ok_or(RollupError::NoSuchZombie(zombie_num))?;
        let first = self.core.first_unresolved_node();

        let mut latest = zombie.latest_staked_node;
        let mut walked = 0u64;
        while latest >= first && walked < max_nodes {
            let node = self.core.node_mut(latest).ok_or(RollupError::UnknownNode(latest))?;
            node.remove_staker(zombie.staker_address);
            latest = node.parent;
            walked += 1;
        }

        if latest < first {
            self.core.remove_zombie_entry(zombie_num);
        } else if let Some(zombie) = self.core.zombie_mut(zombie_num) {
            zombie.latest_staked_node = latest;
        }
        debug!(target: "rollup", zombie = %zombie.staker_address, walked, "zombie walked");
        Ok(())
    }

    /// Drops every zombie whose branch is already fully resolved, starting
    /// at `start_index`.
    pub fn remove_old_zombies(&mut self, start_index: u64) {
        self.sweep_old_zombies(start_index);
    }

    /// Adds the call's value to `target`'s stake.
    pub fn add_to_deposit(&mut self, ctx: &CallContext, target: Address) -> Result<(), RollupError> {
        self.require_unchallenged_staker(target)?;
        if let Some(staker) = self.core.staker_mut(target) {
            staker.amount_staked += ctx.value;
        }
        debug!(target: "rollup", staker = %target, added = %ctx.value, "deposit increased");
        Ok(())
    }

    /// Reduces the caller's stake to `target`, floored at the current
    /// requirement; the excess becomes withdrawable.
    pub fn reduce_deposit(&mut self, ctx: &CallContext, target: U256) -> Result<(), RollupError> {
        self.require_unchallenged_staker(ctx.sender)?;
        let required = self.current_required_stake(ctx);
        let floor = target.max(required);

        let Some(staker) = self.core.staker_mut(ctx.sender) else {
            return Err(RollupError::NotStaked(ctx.sender));
        };
        if staker.amount_staked < floor {
            return Err(RollupError::StakeTooLow { amount: staker.amount_staked, required: floor });
        }
        let excess = staker.amount_staked - floor;
        staker.amount_staked = floor;
        self.core.add_withdrawable(ctx.sender, excess);
        debug!(target: "rollup", staker = %ctx.sender, released = %excess, "deposit reduced");
        Ok(())
    }

    /// Returns the caller's whole deposit once its stake no longer backs an
    /// unresolved node, removing the staker.
    pub fn return_old_deposit(&mut self, ctx: &CallContext) -> Result<(), RollupError> {
        let staker = self.require_unchallenged_staker(ctx.sender)?;
        let staked_on = staker.latest_staked_node;
        let amount = staker.amount_staked;
        if staked_on > self.core.latest_confirmed() {
            return Err(RollupError::StakeActive(staked_on));
        }
        self.core.add_withdrawable(ctx.sender, amount);
        self.core.remove_staker(ctx.sender);
        info!(target: "rollup", staker = %ctx.sender, returned = %amount, "old deposit returned");
        Ok(())
    }

    /// Zeroes and returns the caller's withdrawable balance. The balance is
    /// cleared before any transfer is attempted, so a reentrant call finds
    /// nothing left to withdraw.
    pub fn withdraw_staker_funds(&mut self, ctx: &CallContext) -> Result<U256, RollupError> {
        let amount = self.core.take_withdrawable(ctx.sender);
        info!(target: "rollup", staker = %ctx.sender, amount = %amount, "funds withdrawn");
        Ok(amount)
    }

    fn stake_on_node(&mut self, staker: Address, node_num: NodeNum) {
        if let Some(node) = self.core.node_mut(node_num) {
            node.add_staker(staker);
        }
        if let Some(record) = self.core.staker_mut(staker) {
            record.latest_staked_node = node_num;
        }
    }

    fn require_first_unresolved(&self) -> Result<NodeNum, RollupError> {
        let first = self.core.first_unresolved_node();
        if first > self.core.latest_node_created() {
            return Err(RollupError::NoUnresolvedNode);
        }
        Ok(first)
    }

    fn require_unchallenged_staker(&self, address: Address) -> Result<&crate::Staker, RollupError> {
        let staker = self
            .core
            .staker(address)
            .filter(|staker| staker.is_staked)
            .ok_or(RollupError::NotStaked(address))?;
        if staker.current_challenge.is_some() {
            return Err(RollupError::InChallenge(address));
        }
        Ok(staker)
    }

    fn sweep_old_zombies(&mut self, start_index: u64) {
        let first = self.core.first_unresolved_node();
        let mut index = start_index;
        while index < self.core.zombie_count() {
            let expired = self
                .core
                .zombie(index)
                .is_some_and(|zombie| zombie.latest_staked_node < first);
            if expired {
                self.core.remove_zombie_entry(index);
            } else {
                index += 1;
            }
        }
    }
}
