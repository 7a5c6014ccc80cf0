//! Test utilities for exercising the protocol components.

use crate::{CallDispatcher, CallOutcome};
use alloy_primitives::{Address, Bytes, U256, map::HashSet};

/// A call recorded by the [`MockDispatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedCall {
    /// The call target.
    pub dest: Address,
    /// The native value attached.
    pub value: U256,
    /// The calldata.
    pub data: Bytes,
}

/// A [`CallDispatcher`] that records every dispatched call and succeeds
/// unless the target was registered as failing.
#[derive(Debug, Default)]
pub struct MockDispatcher {
    /// Every call dispatched, in order.
    pub calls: Vec<DispatchedCall>,
    failing: HashSet<Address>,
}

impl MockDispatcher {
    /// Creates a dispatcher where every call succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes all subsequent calls to `dest` report failure.
    pub fn fail_calls_to(&mut self, dest: Address) {
        self.failing.insert(dest);
    }
}

impl CallDispatcher for MockDispatcher {
    fn call(&mut self, dest: Address, value: U256, data: &[u8]) -> CallOutcome {
        self.calls.push(DispatchedCall { dest, value, data: Bytes::copy_from_slice(data) });
        if self.failing.contains(&dest) {
            CallOutcome::failure(Bytes::new())
        } else {
            CallOutcome::success(Bytes::new())
        }
    }
}
