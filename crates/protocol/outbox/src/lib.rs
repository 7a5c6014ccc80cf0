//! Withdrawal redemption for the Arbor protocol.
//!
//! One [`OutboxEntry`] is created per confirmed batch of outgoing messages:
//! a Merkle root over the batch's L2-to-L1 sends, a spent-set, and a
//! remaining-count. The [`Outbox`] redeems single leaves against the root by
//! Merkle proof, exactly once each, and forwards the authorized call through
//! the bridge.

mod outbox;
pub use outbox::{L2ToL1Context, L2ToL1Send, Outbox, OutboxEntry, split_sends};

pub mod merkle;

mod events;
pub use events::OutboxEvent;

mod errors;
pub use errors::OutboxError;
