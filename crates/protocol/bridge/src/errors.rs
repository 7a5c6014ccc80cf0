//! Error types for the bridge and inbox.

use alloy_primitives::Address;
use thiserror::Error;

/// Errors returned by [`Bridge`](crate::Bridge) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The caller is not on the inbox allow-list.
    #[error("caller {0} is not an allow-listed inbox")]
    NotInbox(Address),
    /// The caller is not the currently active outbox.
    #[error("caller {0} is not the active outbox")]
    NotActiveOutbox(Address),
    /// The caller is not the bridge owner.
    #[error("caller {0} is not the bridge owner")]
    NotOwner(Address),
}

/// Errors returned by [`Inbox`](crate::Inbox) entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InboxError {
    /// A `*_from_origin` entry point was invoked through a contract.
    #[error("entry point restricted to the transaction origin")]
    OriginOnly,
    /// The bridge rejected the delivery.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}
