//! Bounded in-memory conversation store.

use crate::ChannelId;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Who contributed a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role-tagged contribution to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

/// Rolling per-channel history, capped at `2 * max_turns` entries.
///
/// Each channel's deque lives in its own map slot. Mutations hold the slot's
/// shard lock for the duration of the append and eviction, so writes to one
/// channel are atomic without serializing unrelated channels. Eviction works
/// on the raw entry count, one entry at a time from the front, so an
/// unanswered user turn is never dropped alongside an older pair.
#[derive(Debug)]
pub struct ConversationStore {
    max_turns: usize,
    channels: DashMap<ChannelId, VecDeque<Turn>>,
}

impl ConversationStore {
    /// Create a store keeping `max_turns` exchanges per channel (minimum 1).
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns: max_turns.max(1),
            channels: DashMap::new(),
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Maximum number of entries retained for a single channel.
    pub fn capacity(&self) -> usize {
        self.max_turns * 2
    }

    pub fn record_user(&self, channel_id: ChannelId, text: impl Into<String>) {
        self.append(channel_id, [Turn::user(text)]);
    }

    pub fn record_assistant(&self, channel_id: ChannelId, text: impl Into<String>) {
        self.append(channel_id, [Turn::assistant(text)]);
    }

    /// Append a full user/assistant exchange under a single lock acquisition.
    pub fn record_exchange(
        &self,
        channel_id: ChannelId,
        user: impl Into<String>,
        assistant: impl Into<String>,
    ) {
        self.append(channel_id, [Turn::user(user), Turn::assistant(assistant)]);
    }

    fn append<const N: usize>(&self, channel_id: ChannelId, turns: [Turn; N]) {
        let capacity = self.capacity();
        let mut history = self.channels.entry(channel_id).or_default();
        history.extend(turns);
        while history.len() > capacity {
            history.pop_front();
        }
    }

    /// Snapshot of a channel's history, oldest first. Empty for unknown channels.
    pub fn history(&self, channel_id: ChannelId) -> Vec<Turn> {
        self.channels
            .get(&channel_id)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop a channel's history entirely. No-op for unknown channels.
    pub fn clear(&self, channel_id: ChannelId) {
        self.channels.remove(&channel_id);
    }

    pub fn len(&self, channel_id: ChannelId) -> usize {
        self.channels
            .get(&channel_id)
            .map(|history| history.len())
            .unwrap_or(0)
    }

    /// Number of channels currently holding history.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn single_exchange_window_keeps_latest_pair() {
        let store = ConversationStore::new(1);
        store.record_user(7, "hi");
        store.record_assistant(7, "hello");
        store.record_user(7, "bye");
        store.record_assistant(7, "later");

        assert_eq!(
            store.history(7),
            vec![Turn::user("bye"), Turn::assistant("later")]
        );
    }

    #[test]
    fn twenty_alternating_appends_keep_last_six_exchanges() {
        let store = ConversationStore::new(6);
        for exchange in 1..=10 {
            store.record_user(1, format!("question {exchange}"));
            store.record_assistant(1, format!("answer {exchange}"));
        }

        let history = store.history(1);
        assert_eq!(history.len(), 12);
        assert_eq!(history[0], Turn::user("question 5"));
        assert_eq!(history[1], Turn::assistant("answer 5"));
        assert_eq!(history[11], Turn::assistant("answer 10"));
    }

    #[test]
    fn eviction_drops_one_entry_at_a_time() {
        let store = ConversationStore::new(1);
        store.record_user(3, "a");
        store.record_assistant(3, "b");
        store.record_user(3, "c");

        // Only the oldest entry goes, the unanswered user turn survives.
        assert_eq!(store.history(3), vec![Turn::assistant("b"), Turn::user("c")]);
    }

    #[test]
    fn retained_suffix_matches_insertion_order() {
        let store = ConversationStore::new(2);
        let mut inserted = Vec::new();
        for index in 0..11 {
            let turn = if index % 3 == 0 {
                Turn::assistant(index.to_string())
            } else {
                Turn::user(index.to_string())
            };
            match turn.role {
                Role::User => store.record_user(9, turn.text.clone()),
                _ => store.record_assistant(9, turn.text.clone()),
            }
            inserted.push(turn);
            assert!(store.len(9) <= 4);
        }

        assert_eq!(store.history(9), inserted[inserted.len() - 4..].to_vec());
    }

    #[test]
    fn unknown_channel_reads_empty_and_clear_is_noop() {
        let store = ConversationStore::new(6);
        assert!(store.history(42).is_empty());
        store.clear(42);
        assert_eq!(store.channel_count(), 0);
    }

    #[test]
    fn clear_removes_history() {
        let store = ConversationStore::new(6);
        store.record_exchange(5, "ping", "pong");
        assert_eq!(store.len(5), 2);

        store.clear(5);
        assert!(store.history(5).is_empty());
        assert_eq!(store.channel_count(), 0);

        store.record_user(5, "again");
        assert_eq!(store.history(5), vec![Turn::user("again")]);
    }

    #[test]
    fn channels_are_isolated() {
        let store = ConversationStore::new(1);
        store.record_exchange(1, "one", "uno");
        store.record_exchange(2, "two", "dos");
        store.record_exchange(2, "three", "tres");

        assert_eq!(store.history(1), vec![Turn::user("one"), Turn::assistant("uno")]);
        assert_eq!(store.history(2), vec![Turn::user("three"), Turn::assistant("tres")]);
    }

    #[test]
    fn zero_max_turns_is_raised_to_one() {
        let store = ConversationStore::new(0);
        assert_eq!(store.max_turns(), 1);
        assert_eq!(store.capacity(), 2);
    }

    #[test]
    fn concurrent_writers_never_lose_appends_or_exceed_bound() {
        let store = Arc::new(ConversationStore::new(50));
        let handles: Vec<_> = (0..4)
            .map(|writer| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for index in 0..25 {
                        store.record_user(11, format!("{writer}:{index}"));
                        store.record_user(writer as u64 + 100, format!("{index}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(11), 100);
        for writer in 0..4u64 {
            let history = store.history(writer + 100);
            let expected: Vec<Turn> = (0..25).map(|index| Turn::user(index.to_string())).collect();
            assert_eq!(history, expected);
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(Role::System.to_string(), "system");
    }
}
