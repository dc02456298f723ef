//! Conversation transcript: the ordered log of turns for one conversation.

pub mod store;
pub mod turn;

pub use store::{TranscriptStore, UpdateMode};
pub use turn::{Role, Turn};
