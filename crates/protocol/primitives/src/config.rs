//! Deployment parameters for the protocol core.

use alloy_primitives::{Address, B256, U256};

/// The parameters a protocol deployment is constructed from.
///
/// These are fixed at initialization and relayed to the executing side
/// through the event bridge's `rollup_initialized` message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CoreConfig {
    /// Blocks an assertion must survive unchallenged before it can be
    /// confirmed.
    pub confirm_period_blocks: u64,
    /// Additional grace blocks granted to an assertion whose parent already
    /// has a competing child.
    pub extra_challenge_time_blocks: u64,
    /// The minimum stake backing an assertion while no assertions are
    /// overdue.
    pub base_stake: U256,
    /// The staking token, or `None` when stake is posted in the native
    /// asset. Token transfer glue lives outside the core.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub stake_token: Option<Address>,
    /// The deployment owner, permitted to administer bridge allow-lists.
    pub owner: Address,
    /// The designated sequencer.
    pub sequencer: Address,
    /// Maximum blocks a delayed message may wait before anyone can force its
    /// inclusion.
    pub max_delay_blocks: u64,
    /// Maximum seconds a delayed message may wait before anyone can force
    /// its inclusion.
    pub max_delay_seconds: u64,
    /// The machine hash the genesis assertion starts from.
    pub genesis_machine_hash: B256,
}
