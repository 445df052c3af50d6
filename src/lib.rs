//! Lurk: a Discord relay that keeps a short rolling window per channel and
//! answers through a chat completion endpoint.

pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod messaging;
pub mod persona;
pub mod router;

pub use error::{Error, Result};

use serde::{Deserialize, Serialize};

/// Channel identifier type (platform snowflake).
pub type ChannelId = u64;

/// User identifier type (platform snowflake).
pub type UserId = u64;

/// Message identifier type (platform snowflake).
pub type MessageId = u64;

/// Inbound message from the messaging platform.
///
/// Adapters flatten whatever the platform delivers into this shape so the
/// router never touches platform types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub author_is_bot: bool,
    /// Raw platform content, mention syntax intact.
    pub content: String,
    /// Display text with mentions rewritten to readable names.
    pub text: String,
    /// Users mentioned in the message.
    pub mentions: Vec<UserId>,
    /// Author of the message this one replies to, if it is a reply.
    pub reply_to_author: Option<UserId>,
    /// One-to-one channel (DM) rather than a group channel.
    pub is_direct: bool,
}

/// Reply sent back to the messaging platform, linked to the triggering message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundResponse {
    pub text: String,
    /// Whether the reply pings the author of the triggering message.
    pub mention_author: bool,
}

impl OutboundResponse {
    /// A linked reply that does not notify the author.
    pub fn quiet_reply(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mention_author: false,
        }
    }
}

/// Status updates for messaging platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusUpdate {
    Typing,
    StopTyping,
}
