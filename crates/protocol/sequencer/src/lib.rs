//! Delay-bounded sequencer batching for the Arbor protocol.
//!
//! The [`SequencerInbox`] lets the designated sequencer post large
//! transaction batches cheaply while guaranteeing that every message routed
//! through the delayed inbox is incorporated within a bounded number of
//! blocks and seconds; once a delayed message ages past the bound, anyone
//! may splice it in through [`SequencerInbox::force_inclusion`].

mod inbox;
pub use inbox::{BatchSubmission, ForcedMessage, SequencerInbox};

mod batch;
pub use batch::{SequencerBatch, add_delayed_messages, add_sequencer_item, item_prefix_hash};

mod events;
pub use events::SequencerInboxEvent;

mod errors;
pub use errors::SequencerInboxError;
