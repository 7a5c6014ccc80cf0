//! Core primitives for the Arbor dispute and settlement protocol.
//!
//! This crate defines the building blocks shared by every protocol component:
//! the transaction [`CallContext`] passed into state-changing operations, the
//! outbound-call abstraction ([`CallDispatcher`]), delayed message hashing and
//! the append-only [`InboxAccumulator`], and the [`CoreConfig`] parameters a
//! deployment is constructed from.

mod context;
pub use context::{CallContext, CallDispatcher, CallOutcome};

mod message;
pub use message::{DelayedMessage, InvalidMessageKind, MessageKind};

mod accumulator;
pub use accumulator::{InboxAccumulator, chain_accumulator};

mod config;
pub use config::CoreConfig;

pub mod encoding;

#[cfg(any(test, feature = "test-utils"))]
mod test_utils;
#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::{DispatchedCall, MockDispatcher};
