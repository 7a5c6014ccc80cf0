//! The lifecycle relay: rollup transitions mirrored into the delayed inbox.

use crate::{NodeNum, RollupError};
use alloy_primitives::{Address, Bytes, keccak256};
use arbor_bridge::Bridge;
use arbor_primitives::{
    CallContext, CoreConfig, MessageKind,
    encoding::{u256_word, word},
};
use tracing::debug;

const INIT_EVENT: u8 = 0;
const CREATE_NODE_EVENT: u8 = 1;
const CONFIRM_NODE_EVENT: u8 = 2;
const REJECT_NODE_EVENT: u8 = 3;
const STAKE_CREATED_EVENT: u8 = 4;
const CLAIM_NODE_EVENT: u8 = 5;

/// Relays rollup lifecycle transitions as delayed inbox messages so the
/// executing side can mirror rollup state without a separate oracle.
///
/// Every method is callable only by the rollup; each encodes a fixed
/// per-event byte layout (a one-byte tag followed by 32-byte words and raw
/// addresses) and delivers it through the bridge as a
/// [`MessageKind::RollupEvent`].
#[derive(Debug)]
pub struct RollupEventBridge {
    address: Address,
    rollup: Address,
    relayed: Vec<Bytes>,
}

impl RollupEventBridge {
    /// Creates an event bridge writable only by `rollup`.
    pub const fn new(address: Address, rollup: Address) -> Self {
        Self { address, rollup, relayed: Vec::new() }
    }

    /// The event bridge's own address. Must be allow-listed as an inbox on
    /// the bridge.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Every payload relayed so far, in order.
    pub fn relayed(&self) -> &[Bytes] {
        &self.relayed
    }

    /// Relays the deployment parameters at initialization.
    pub fn rollup_initialized(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        config: &CoreConfig,
    ) -> Result<u64, RollupError> {
        let mut data = Vec::with_capacity(1 + 32 * 3 + 20 * 2);
        data.push(INIT_EVENT);
        data.extend_from_slice(&word(config.confirm_period_blocks));
        data.extend_from_slice(&word(config.extra_challenge_time_blocks));
        data.extend_from_slice(&u256_word(config.base_stake));
        data.extend_from_slice(config.stake_token.unwrap_or(Address::ZERO).as_slice());
        data.extend_from_slice(config.owner.as_slice());
        self.deliver(ctx, bridge, data)
    }

    /// Relays a node creation.
    pub fn node_created(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        node_num: NodeNum,
        parent: NodeNum,
        deadline_block: u64,
        asserter: Address,
    ) -> Result<u64, RollupError> {
        let mut data = Vec::with_capacity(1 + 32 * 4 + 20);
        data.push(CREATE_NODE_EVENT);
        data.extend_from_slice(&word(node_num));
        data.extend_from_slice(&word(parent));
        data.extend_from_slice(&word(ctx.block_number));
        data.extend_from_slice(&word(deadline_block));
        data.extend_from_slice(asserter.as_slice());
        self.deliver(ctx, bridge, data)
    }

    /// Relays a node confirmation.
    pub fn node_confirmed(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        node_num: NodeNum,
    ) -> Result<u64, RollupError> {
        let mut data = Vec::with_capacity(1 + 32);
        data.push(CONFIRM_NODE_EVENT);
        data.extend_from_slice(&word(node_num));
        self.deliver(ctx, bridge, data)
    }

    /// Relays a node rejection.
    pub fn node_rejected(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        node_num: NodeNum,
    ) -> Result<u64, RollupError> {
        let mut data = Vec::with_capacity(1 + 32);
        data.push(REJECT_NODE_EVENT);
        data.extend_from_slice(&word(node_num));
        self.deliver(ctx, bridge, data)
    }

    /// Relays a stake creation.
    pub fn stake_created(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        staker: Address,
        node_num: NodeNum,
    ) -> Result<u64, RollupError> {
        let mut data = Vec::with_capacity(1 + 20 + 32 * 2);
        data.push(STAKE_CREATED_EVENT);
        data.extend_from_slice(staker.as_slice());
        data.extend_from_slice(&word(node_num));
        data.extend_from_slice(&word(ctx.block_number));
        self.deliver(ctx, bridge, data)
    }

    /// Relays a node claim after a challenge verdict.
    pub fn node_claimed(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        node_num: NodeNum,
        claimer: Address,
    ) -> Result<u64, RollupError> {
        let mut data = Vec::with_capacity(1 + 32 + 20);
        data.push(CLAIM_NODE_EVENT);
        data.extend_from_slice(&word(node_num));
        data.extend_from_slice(claimer.as_slice());
        self.deliver(ctx, bridge, data)
    }

    fn deliver(
        &mut self,
        ctx: &CallContext,
        bridge: &mut Bridge,
        data: Vec<u8>,
    ) -> Result<u64, RollupError> {
        if ctx.sender != self.rollup {
            return Err(RollupError::OnlyRollup(ctx.sender));
        }
        let message_num = bridge.deliver_message_to_inbox(
            &ctx.forward(self.address),
            MessageKind::RollupEvent,
            self.rollup,
            keccak256(&data),
        )?;
        debug!(target: "rollup", message_num, tag = data[0], "lifecycle event relayed");
        self.relayed.push(data.into());
        Ok(message_num)
    }
}
