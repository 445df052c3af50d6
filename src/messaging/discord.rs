//! Discord messaging adapter using serenity.

use crate::messaging::traits::{InboundStream, Messaging};
use crate::{InboundMessage, OutboundResponse, StatusUpdate, UserId};

use anyhow::Context as _;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use serenity::all::{
    ChannelId, Context, CreateAllowedMentions, CreateMessage, EventHandler, GatewayIntents, Http,
    Message, MessageId, Ready, ShardManager, User,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};

/// Discord's per-message character limit.
const MAX_MESSAGE_LEN: usize = 2000;

/// Discord adapter state.
pub struct DiscordAdapter {
    token: String,
    http: Arc<RwLock<Option<Arc<Http>>>>,
    bot_user_id: Arc<ArcSwapOption<UserId>>,
    /// Typing handles per message. Typing stops when the handle is dropped.
    typing_tasks: Arc<RwLock<HashMap<u64, serenity::http::Typing>>>,
    shard_manager: Arc<RwLock<Option<Arc<ShardManager>>>>,
}

impl DiscordAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            http: Arc::new(RwLock::new(None)),
            bot_user_id: Arc::new(ArcSwapOption::empty()),
            typing_tasks: Arc::new(RwLock::new(HashMap::new())),
            shard_manager: Arc::new(RwLock::new(None)),
        }
    }

    async fn get_http(&self) -> anyhow::Result<Arc<Http>> {
        self.http
            .read()
            .await
            .clone()
            .context("discord not connected")
    }

    async fn stop_typing(&self, message_id: u64) {
        // Typing stops when the handle is dropped
        self.typing_tasks.write().await.remove(&message_id);
    }
}

impl Messaging for DiscordAdapter {
    async fn start(&self) -> crate::Result<InboundStream> {
        let (inbound_tx, inbound_rx) = mpsc::channel(256);

        let handler = Handler {
            inbound_tx,
            http_slot: self.http.clone(),
            bot_user_id_slot: self.bot_user_id.clone(),
        };

        let intents = GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILDS;

        let mut client = serenity::Client::builder(&self.token, intents)
            .event_handler(handler)
            .await
            .context("failed to build discord client")?;

        *self.http.write().await = Some(client.http.clone());
        *self.shard_manager.write().await = Some(client.shard_manager.clone());

        tokio::spawn(async move {
            if let Err(error) = client.start().await {
                tracing::error!(%error, "discord gateway error");
            }
        });

        let stream = tokio_stream::wrappers::ReceiverStream::new(inbound_rx);
        Ok(Box::pin(stream))
    }

    fn bot_user_id(&self) -> Option<UserId> {
        self.bot_user_id.load_full().map(|id| *id)
    }

    async fn respond(
        &self,
        message: &InboundMessage,
        response: OutboundResponse,
    ) -> crate::Result<()> {
        self.stop_typing(message.id).await;

        let http = self.get_http().await?;
        let channel_id = ChannelId::new(message.channel_id);
        let mut chunks = split_message(&response.text, MAX_MESSAGE_LEN).into_iter();

        if let Some(first) = chunks.next() {
            let builder = CreateMessage::new()
                .content(first)
                .reference_message((channel_id, MessageId::new(message.id)))
                .allowed_mentions(
                    CreateAllowedMentions::new()
                        .all_users(true)
                        .all_roles(true)
                        .replied_user(response.mention_author),
                );
            channel_id
                .send_message(&*http, builder)
                .await
                .context("failed to send discord reply")?;
        }

        for chunk in chunks {
            channel_id
                .say(&*http, &chunk)
                .await
                .context("failed to send discord message")?;
        }

        Ok(())
    }

    async fn send_status(
        &self,
        message: &InboundMessage,
        status: StatusUpdate,
    ) -> crate::Result<()> {
        match status {
            StatusUpdate::Typing => {
                let http = self.get_http().await?;
                let channel_id = ChannelId::new(message.channel_id);

                let typing = channel_id.start_typing(&http);
                self.typing_tasks.write().await.insert(message.id, typing);
            }
            StatusUpdate::StopTyping => {
                self.stop_typing(message.id).await;
            }
        }

        Ok(())
    }

    async fn health_check(&self) -> crate::Result<()> {
        let http = self.get_http().await?;
        http.get_current_user()
            .await
            .context("discord health check failed")?;
        Ok(())
    }

    async fn shutdown(&self) -> crate::Result<()> {
        self.typing_tasks.write().await.clear();

        if let Some(shard_manager) = self.shard_manager.read().await.as_ref() {
            shard_manager.shutdown_all().await;
        }

        tracing::info!("discord adapter shut down");
        Ok(())
    }
}

// -- Serenity EventHandler --

struct Handler {
    inbound_tx: mpsc::Sender<InboundMessage>,
    http_slot: Arc<RwLock<Option<Arc<Http>>>>,
    bot_user_id_slot: Arc<ArcSwapOption<UserId>>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(
            bot_name = %ready.user.name,
            bot_id = %ready.user.id,
            guild_count = ready.guilds.len(),
            "discord connected"
        );

        *self.http_slot.write().await = Some(ctx.http.clone());
        self.bot_user_id_slot
            .store(Some(Arc::new(ready.user.id.get())));
    }

    async fn message(&self, _ctx: Context, message: Message) {
        let inbound = to_inbound(&message);

        if let Err(error) = self.inbound_tx.send(inbound).await {
            tracing::warn!(
                %error,
                "failed to send inbound message from Discord (receiver dropped)"
            );
        }
    }
}

// -- Helper functions --

/// Flatten a serenity message into the platform-neutral shape.
fn to_inbound(message: &Message) -> InboundMessage {
    InboundMessage {
        id: message.id.get(),
        channel_id: message.channel_id.get(),
        author_id: message.author.id.get(),
        author_is_bot: message.author.bot,
        content: message.content.clone(),
        text: resolve_mentions(&message.content, &message.mentions),
        mentions: message.mentions.iter().map(|user| user.id.get()).collect(),
        reply_to_author: message
            .referenced_message
            .as_ref()
            .map(|referenced| referenced.author.id.get()),
        // DMs carry no guild
        is_direct: message.guild_id.is_none(),
    }
}

/// Replace raw Discord mention syntax (`<@ID>` and `<@!ID>`) with readable display names.
/// Serenity provides resolved `User` objects in `message.mentions` for every mention in the text.
fn resolve_mentions(content: &str, mentions: &[User]) -> String {
    let mut resolved = content.to_string();
    for user in mentions {
        let display_name = user.global_name.as_deref().unwrap_or(&user.name);
        resolved = replace_mention(&resolved, user.id.get(), display_name);
    }
    resolved
}

fn replace_mention(content: &str, user_id: u64, display_name: &str) -> String {
    let readable = format!("@{display_name}");
    content
        .replace(&format!("<@{user_id}>"), &readable)
        // Legacy nickname mention format
        .replace(&format!("<@!{user_id}>"), &readable)
}

/// Split a message into chunks that fit within Discord's 2000 char limit.
/// Tries to split at newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let boundary = remaining.floor_char_boundary(max_len);
        let split_at = remaining[..boundary]
            .rfind('\n')
            .or_else(|| remaining[..boundary].rfind(' '))
            .filter(|&index| index > 0)
            .unwrap_or(boundary);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_messages_are_not_split() {
        assert_eq!(split_message("hello", 2000), vec!["hello"]);
    }

    #[test]
    fn splits_prefer_newlines_then_spaces() {
        let text = format!("{}\n{}", "a".repeat(15), "b".repeat(15));
        assert_eq!(split_message(&text, 20), vec!["a".repeat(15), "b".repeat(15)]);

        let text = format!("{} {}", "c".repeat(12), "d".repeat(12));
        assert_eq!(split_message(&text, 20), vec!["c".repeat(12), "d".repeat(12)]);
    }

    #[test]
    fn hard_cut_when_no_whitespace() {
        let chunks = split_message(&"x".repeat(45), 20);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|chunk| chunk.len() <= 20));
        assert_eq!(chunks.concat(), "x".repeat(45));
    }

    #[test]
    fn hard_cut_respects_char_boundaries() {
        let text = "é".repeat(15);
        let chunks = split_message(&text, 9);
        assert!(chunks.iter().all(|chunk| chunk.len() <= 9));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn mentions_become_display_names() {
        let content = "hey <@42> and <@!42>, meet <@7>";
        let resolved = replace_mention(content, 42, "Lurk");
        assert_eq!(resolved, "hey @Lurk and @Lurk, meet <@7>");
    }
}
