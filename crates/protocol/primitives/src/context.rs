//! The transaction environment and outbound-call abstraction.

use alloy_primitives::{Address, Bytes, U256};

/// The environment of a single protocol call.
///
/// The ledger imposes one global serial order on transactions; every
/// state-changing operation receives the environment of the transaction it
/// runs in by reference. Components that call into other components forward
/// the same environment with [`CallContext::forward`], swapping only the
/// caller, so allow-list checks always see the immediate caller while the
/// block height, timestamp, and origin stay fixed for the whole transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// The immediate caller of the operation.
    pub sender: Address,
    /// The externally-owned account that originated the transaction.
    pub origin: Address,
    /// The native value accompanying the call.
    pub value: U256,
    /// The gas price the originating transaction paid, recorded into delayed
    /// message hashes.
    pub gas_price: U256,
    /// The current block height.
    pub block_number: u64,
    /// The current block timestamp, in seconds.
    pub block_timestamp: u64,
}

impl CallContext {
    /// Creates a context for a top-level call from `sender` at the given
    /// block height and timestamp. The origin is the sender and no value is
    /// attached.
    pub const fn new(sender: Address, block_number: u64, block_timestamp: u64) -> Self {
        Self {
            sender,
            origin: sender,
            value: U256::ZERO,
            gas_price: U256::ZERO,
            block_number,
            block_timestamp,
        }
    }

    /// Attaches native value to the call.
    pub const fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Overrides the transaction origin.
    pub const fn with_origin(mut self, origin: Address) -> Self {
        self.origin = origin;
        self
    }

    /// Sets the gas price of the originating transaction.
    pub const fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Re-issues this environment as an internal call from `sender`,
    /// preserving the origin, block height, and timestamp. Value does not
    /// propagate across internal calls.
    pub const fn forward(&self, sender: Address) -> Self {
        Self {
            sender,
            origin: self.origin,
            value: U256::ZERO,
            gas_price: self.gas_price,
            block_number: self.block_number,
            block_timestamp: self.block_timestamp,
        }
    }

    /// Whether the immediate caller is the transaction origin.
    pub fn is_origin_call(&self) -> bool {
        self.sender == self.origin
    }
}

/// The result of a forwarded low-level call.
///
/// Forwarded calls report failure instead of raising it: a `false`
/// [`CallOutcome::success`] never unwinds the state the caller committed
/// before dispatching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    /// Whether the callee completed without fault.
    pub success: bool,
    /// The callee's return (or revert) data.
    pub return_data: Bytes,
}

impl CallOutcome {
    /// A successful outcome carrying `return_data`.
    pub fn success(return_data: impl Into<Bytes>) -> Self {
        Self { success: true, return_data: return_data.into() }
    }

    /// A failed outcome carrying the callee's revert data.
    pub fn failure(return_data: impl Into<Bytes>) -> Self {
        Self { success: false, return_data: return_data.into() }
    }
}

/// Dispatches low-level calls on behalf of the bridge.
///
/// The settlement-side execution engine is a collaborator of the protocol,
/// not part of it; the bridge routes authorized outbound calls through this
/// trait and treats whatever comes back as data. Implementations must not
/// panic on callee failure.
pub trait CallDispatcher {
    /// Performs a call to `dest` with the given value and calldata.
    fn call(&mut self, dest: Address, value: U256, data: &[u8]) -> CallOutcome;
}
