//! Deployment assembly: every component behind one wiring of addresses.

use crate::{
    ChallengeArgs, ChallengeFactory, ConfirmArgs, NewNodeArgs, NodeNum, Rollup, RollupError,
    RollupEventBridge,
};
use alloy_primitives::{Address, B256, Bytes, U256};
use arbor_bridge::{Bridge, BridgeError, Inbox, InboxError, RetryableTicket};
use arbor_outbox::{L2ToL1Send, Outbox, OutboxError};
use arbor_primitives::{CallContext, CallDispatcher, CallOutcome, CoreConfig};
use arbor_sequencer::{BatchSubmission, ForcedMessage, SequencerInbox, SequencerInboxError};

/// The component addresses of one deployment, fixed at construction.
///
/// Components reference each other only through these addresses and the
/// caller checks each operation performs; the wiring never changes after
/// assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wiring {
    /// The rollup's address.
    pub rollup: Address,
    /// The bridge's address.
    pub bridge: Address,
    /// The delayed inbox's address.
    pub inbox: Address,
    /// The sequencer inbox's address.
    pub sequencer_inbox: Address,
    /// The outbox's address.
    pub outbox: Address,
    /// The event bridge's address.
    pub event_bridge: Address,
}

/// One fully wired deployment of the protocol core.
///
/// Owns every component and routes multi-component transitions with
/// disjoint borrows, standing in for the ledger's cross-contract calls.
#[derive(Debug)]
pub struct CoreSystem {
    wiring: Wiring,
    /// The delayed message bridge.
    pub bridge: Bridge,
    /// The user-facing delayed inbox.
    pub inbox: Inbox,
    /// The sequencer inbox.
    pub sequencer_inbox: SequencerInbox,
    /// The withdrawal outbox.
    pub outbox: Outbox,
    /// The dispute state machine.
    pub rollup: Rollup,
    /// The lifecycle relay.
    pub event_bridge: RollupEventBridge,
}

impl CoreSystem {
    /// Assembles a deployment: allow-lists the inbox and event bridge on the
    /// bridge, activates the outbox, seeds the genesis node, and relays the
    /// initialization parameters.
    pub fn new(
        config: CoreConfig,
        wiring: Wiring,
        challenge_factory: Box<dyn ChallengeFactory>,
        ctx: &CallContext,
    ) -> Result<Self, RollupError> {
        let mut bridge = Bridge::new(wiring.bridge, config.owner);
        let owner_ctx = ctx.forward(config.owner);
        bridge.set_inbox(&owner_ctx, wiring.inbox, true)?;
        bridge.set_inbox(&owner_ctx, wiring.event_bridge, true)?;
        bridge.set_outbox(&owner_ctx, wiring.outbox, true)?;

        let inbox = Inbox::new(wiring.inbox);
        let sequencer_inbox = SequencerInbox::new(wiring.sequencer_inbox, &config);
        let outbox = Outbox::new(wiring.outbox, wiring.rollup);
        let mut event_bridge = RollupEventBridge::new(wiring.event_bridge, wiring.rollup);
        let rollup = Rollup::new(wiring.rollup, config, challenge_factory);

        event_bridge.rollup_initialized(
            &ctx.forward(wiring.rollup),
            &mut bridge,
            rollup.config(),
        )?;

        Ok(Self { wiring, bridge, inbox, sequencer_inbox, outbox, rollup, event_bridge })
    }

    /// The deployment's wiring.
    pub const fn wiring(&self) -> &Wiring {
        &self.wiring
    }

    /// Creates a stake for the caller. See [`Rollup::new_stake`].
    pub fn new_stake(&mut self, ctx: &CallContext) -> Result<(), RollupError> {
        self.rollup.new_stake(ctx, &mut self.bridge, &mut self.event_bridge)
    }

    /// Moves the caller's stake onto an existing node. See
    /// [`Rollup::stake_on_existing_node`].
    pub fn stake_on_existing_node(
        &mut self,
        ctx: &CallContext,
        node_num: NodeNum,
        expected_node_hash: B256,
    ) -> Result<(), RollupError> {
        self.rollup.stake_on_existing_node(ctx, node_num, expected_node_hash)
    }

    /// Creates a new node backed by the caller's stake. See
    /// [`Rollup::stake_on_new_node`].
    pub fn stake_on_new_node(
        &mut self,
        ctx: &CallContext,
        args: &NewNodeArgs,
    ) -> Result<NodeNum, RollupError> {
        self.rollup.stake_on_new_node(
            ctx,
            &self.sequencer_inbox,
            &mut self.bridge,
            &mut self.event_bridge,
            args,
        )
    }

    /// Confirms the first unresolved node. See [`Rollup::confirm_next_node`].
    pub fn confirm_next_node(
        &mut self,
        ctx: &CallContext,
        args: &ConfirmArgs,
    ) -> Result<(), RollupError> {
        self.rollup.confirm_next_node(
            ctx,
            &mut self.outbox,
            &mut self.bridge,
            &mut self.event_bridge,
            args,
        )
    }

    /// Rejects the first unresolved node. See [`Rollup::reject_next_node`].
    pub fn reject_next_node(
        &mut self,
        ctx: &CallContext,
        staker_witness: Address,
    ) -> Result<(), RollupError> {
        self.rollup.reject_next_node(ctx, &mut self.bridge, &mut self.event_bridge, staker_witness)
    }

    /// Opens a challenge between conflicting stakers. See
    /// [`Rollup::create_challenge`].
    pub fn create_challenge(
        &mut self,
        ctx: &CallContext,
        args: &ChallengeArgs,
    ) -> Result<Address, RollupError> {
        self.rollup.create_challenge(ctx, args)
    }

    /// Consumes a challenge verdict. See [`Rollup::complete_challenge`].
    pub fn complete_challenge(
        &mut self,
        ctx: &CallContext,
        winning_staker: Address,
        losing_staker: Address,
    ) -> Result<(), RollupError> {
        self.rollup.complete_challenge(
            ctx,
            &mut self.bridge,
            &mut self.event_bridge,
            winning_staker,
            losing_staker,
        )
    }

    /// Delivers an L2 message through the delayed inbox.
    pub fn send_l2_message(&mut self, ctx: &CallContext, data: Bytes) -> Result<u64, InboxError> {
        self.inbox.send_l2_message(ctx, &mut self.bridge, data)
    }

    /// Deposits the call's native value through the delayed inbox.
    pub fn deposit_eth(&mut self, ctx: &CallContext, dest: Address) -> Result<u64, InboxError> {
        self.inbox.deposit_eth(ctx, &mut self.bridge, dest)
    }

    /// Submits a retryable ticket through the delayed inbox.
    pub fn create_retryable_ticket(
        &mut self,
        ctx: &CallContext,
        ticket: &RetryableTicket,
    ) -> Result<u64, InboxError> {
        self.inbox.create_retryable_ticket(ctx, &mut self.bridge, ticket)
    }

    /// Seals a sequencer batch. See
    /// [`SequencerInbox::add_sequencer_l2_batch`].
    pub fn add_sequencer_l2_batch(
        &mut self,
        ctx: &CallContext,
        submission: &BatchSubmission,
    ) -> Result<u64, SequencerInboxError> {
        self.sequencer_inbox.add_sequencer_l2_batch(ctx, &self.bridge, submission)
    }

    /// Forces an overdue delayed message into the sequencer's accumulator.
    /// See [`SequencerInbox::force_inclusion`].
    pub fn force_inclusion(
        &mut self,
        ctx: &CallContext,
        total_delayed_messages_read: u64,
        message: &ForcedMessage,
    ) -> Result<u64, SequencerInboxError> {
        self.sequencer_inbox.force_inclusion(
            ctx,
            &self.bridge,
            total_delayed_messages_read,
            message,
        )
    }

    /// Redeems one outgoing send against a confirmed outbox entry. See
    /// [`Outbox::execute_transaction`].
    pub fn execute_transaction(
        &mut self,
        ctx: &CallContext,
        dispatcher: &mut dyn CallDispatcher,
        outbox_index: u64,
        proof: &[B256],
        index: u64,
        send: &L2ToL1Send,
    ) -> Result<CallOutcome, OutboxError> {
        self.outbox.execute_transaction(
            ctx,
            &mut self.bridge,
            dispatcher,
            outbox_index,
            proof,
            index,
            send,
        )
    }

    /// Retires an outbox from the bridge allow-list. Owner only.
    pub fn remove_old_outbox(
        &mut self,
        ctx: &CallContext,
        outbox: Address,
    ) -> Result<(), BridgeError> {
        self.bridge.set_outbox(ctx, outbox, false)
    }

    /// Walks a zombie's branch. See [`Rollup::remove_zombie`].
    pub fn remove_zombie(&mut self, zombie_num: u64, max_nodes: u64) -> Result<(), RollupError> {
        self.rollup.remove_zombie(zombie_num, max_nodes)
    }

    /// Drops fully resolved zombies. See [`Rollup::remove_old_zombies`].
    pub fn remove_old_zombies(&mut self, start_index: u64) {
        self.rollup.remove_old_zombies(start_index);
    }

    /// Adds to a staker's deposit. See [`Rollup::add_to_deposit`].
    pub fn add_to_deposit(&mut self, ctx: &CallContext, target: Address) -> Result<(), RollupError> {
        self.rollup.add_to_deposit(ctx, target)
    }

    /// Reduces the caller's deposit. See [`Rollup::reduce_deposit`].
    pub fn reduce_deposit(&mut self, ctx: &CallContext, target: U256) -> Result<(), RollupError> {
        self.rollup.reduce_deposit(ctx, target)
    }

    /// Returns the caller's old deposit. See [`Rollup::return_old_deposit`].
    pub fn return_old_deposit(&mut self, ctx: &CallContext) -> Result<(), RollupError> {
        self.rollup.return_old_deposit(ctx)
    }

    /// Withdraws the caller's released funds. See
    /// [`Rollup::withdraw_staker_funds`].
    pub fn withdraw_staker_funds(&mut self, ctx: &CallContext) -> Result<U256, RollupError> {
        self.rollup.withdraw_staker_funds(ctx)
    }
}
