//! Per-channel conversation history.

pub mod store;

pub use store::{ConversationStore, Role, Turn};
