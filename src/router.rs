//! Response routing: decides whether to engage with an inbound message,
//! keeps the conversation store current, and relays generated replies.

pub mod command;

pub use command::Command;

use crate::config::Config;
use crate::conversation::ConversationStore;
use crate::error::LlmError;
use crate::llm::{ChatCompletion, CompletionRequest};
use crate::messaging::Messaging;
use crate::persona::PersonaDirectives;
use crate::{InboundMessage, OutboundResponse, StatusUpdate, UserId};

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Sent in place of a reply when generation fails.
pub const FALLBACK_REPLY: &str =
    "My brain just tripped over its own shoelaces. Give me a sec and try again.";

/// Sent after a channel's history is cleared.
pub const RESET_CONFIRMATION: &str = "Alright, fresh slate. What chaos are we conjuring now?";

/// Completion parameters and command syntax used by the router.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub model: String,
    pub temperature: f32,
    pub completion_timeout: Duration,
    pub command_prefix: String,
}

impl RouterSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            completion_timeout: config.llm.timeout,
            command_prefix: config.command_prefix.clone(),
        }
    }
}

/// What to do with an inbound message, decided before any suspension.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Ignore,
    Reset,
    /// The user turn is already recorded; the request is ready to send.
    Generate(CompletionRequest),
}

/// Engagement policy for a message that passed the self filter.
///
/// Without a known identity nothing engages. Otherwise DMs, explicit mentions,
/// and replies to the bot's own messages do.
pub fn should_respond(message: &InboundMessage, bot_user_id: Option<UserId>) -> bool {
    let Some(bot_user_id) = bot_user_id else {
        return false;
    };

    message.is_direct
        || message.mentions.contains(&bot_user_id)
        || message.reply_to_author == Some(bot_user_id)
}

/// Routes inbound messages through the conversation store and completion model.
///
/// Holds the single store and persona for the process lifetime. Handling is
/// split in two: `admit` runs synchronously in arrival order (filtering,
/// commands, engagement, recording the user turn, composing the prompt) and
/// `execute` performs the suspending work (the completion call and replies).
pub struct ResponseRouter<M, C> {
    messaging: Arc<M>,
    completion: Arc<C>,
    store: Arc<ConversationStore>,
    persona: Arc<PersonaDirectives>,
    settings: RouterSettings,
}

impl<M: Messaging, C: ChatCompletion> ResponseRouter<M, C> {
    pub fn new(
        messaging: Arc<M>,
        completion: Arc<C>,
        store: Arc<ConversationStore>,
        persona: Arc<PersonaDirectives>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            messaging,
            completion,
            store,
            persona,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub fn persona(&self) -> &PersonaDirectives {
        &self.persona
    }

    /// Handle one inbound message start to finish.
    pub async fn handle_incoming_message(&self, message: InboundMessage) {
        let action = self.admit(&message);
        self.execute(&message, action).await;
    }

    /// Run `admit` inline, then spawn the remainder so the event stream keeps
    /// flowing. Returns `None` when there is nothing left to do.
    pub fn dispatch(self: &Arc<Self>, message: InboundMessage) -> Option<JoinHandle<()>> {
        let action = self.admit(&message);
        if action == Action::Ignore {
            return None;
        }

        let router = self.clone();
        Some(tokio::spawn(async move {
            router.execute(&message, action).await;
        }))
    }

    /// Synchronous half of message handling.
    pub fn admit(&self, message: &InboundMessage) -> Action {
        let bot_user_id = self.messaging.bot_user_id();

        if message.author_is_bot || bot_user_id == Some(message.author_id) {
            tracing::trace!(message_id = message.id, "ignoring bot-authored message");
            return Action::Ignore;
        }

        if let Some(command) =
            command::parse(&message.content, &self.settings.command_prefix, bot_user_id)
        {
            return match command {
                Command::Reset => Action::Reset,
            };
        }

        if !should_respond(message, bot_user_id) {
            return Action::Ignore;
        }

        let text = message.text.trim();
        if text.is_empty() {
            tracing::debug!(message_id = message.id, "ignoring message with no text");
            return Action::Ignore;
        }

        tracing::debug!(
            channel_id = message.channel_id,
            message_id = message.id,
            "engaging with message"
        );

        // The recorded turn is part of the history sent, and the new message
        // follows it again as the final entry.
        self.store.record_user(message.channel_id, text);
        let history = self.store.history(message.channel_id);

        Action::Generate(CompletionRequest::compose(
            self.settings.model.clone(),
            self.settings.temperature,
            self.persona.system_message(),
            history,
            text,
        ))
    }

    /// Suspending half of message handling.
    pub async fn execute(&self, message: &InboundMessage, action: Action) {
        match action {
            Action::Ignore => {}
            Action::Reset => self.reset(message).await,
            Action::Generate(request) => self.generate(message, request).await,
        }
    }

    async fn reset(&self, message: &InboundMessage) {
        self.store.clear(message.channel_id);
        tracing::info!(channel_id = message.channel_id, "conversation history cleared");
        self.reply(message, RESET_CONFIRMATION).await;
    }

    async fn generate(&self, message: &InboundMessage, request: CompletionRequest) {
        self.status(message, StatusUpdate::Typing).await;
        let result = self.complete_with_timeout(request).await;
        self.status(message, StatusUpdate::StopTyping).await;

        match result {
            Ok(reply) => {
                self.store.record_assistant(message.channel_id, reply.as_str());
                self.reply(message, &reply).await;
            }
            Err(error) => {
                tracing::error!(
                    %error,
                    channel_id = message.channel_id,
                    message_id = message.id,
                    model = %self.settings.model,
                    "failed to generate response"
                );
                self.reply(message, FALLBACK_REPLY).await;
            }
        }
    }

    async fn complete_with_timeout(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<String, LlmError> {
        let timeout = self.settings.completion_timeout;
        let reply = tokio::time::timeout(timeout, self.completion.complete(request))
            .await
            .map_err(|_| LlmError::Timeout(timeout))??;

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(reply.to_string())
    }

    async fn reply(&self, message: &InboundMessage, text: &str) {
        if let Err(error) = self
            .messaging
            .respond(message, OutboundResponse::quiet_reply(text))
            .await
        {
            tracing::warn!(%error, channel_id = message.channel_id, "failed to send reply");
        }
    }

    async fn status(&self, message: &InboundMessage, status: StatusUpdate) {
        if let Err(error) = self.messaging.send_status(message, status).await {
            tracing::debug!(%error, channel_id = message.channel_id, "failed to send status");
        }
    }
}
