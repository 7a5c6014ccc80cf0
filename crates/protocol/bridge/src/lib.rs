//! The delayed message bridge of the Arbor protocol.
//!
//! The [`Bridge`] is the single source of truth for inbound messages that
//! have not yet been consumed by the sequencer path: an append-only keccak
//! accumulator plus the allow-lists deciding who may deliver into it and who
//! may route authorized calls out of it. The [`Inbox`] is the user-facing
//! delayed entry point layered on top.

mod bridge;
pub use bridge::Bridge;

mod inbox;
pub use inbox::{Inbox, RetryableTicket};

mod events;
pub use events::{BridgeEvent, InboxEvent};

mod errors;
pub use errors::{BridgeError, InboxError};
