//! Messaging trait implemented by platform adapters.

use crate::error::Result;
use crate::{InboundMessage, OutboundResponse, StatusUpdate, UserId};
use futures::Stream;
use std::pin::Pin;

/// Message stream type.
pub type InboundStream = Pin<Box<dyn Stream<Item = InboundMessage> + Send>>;

/// Static trait for messaging adapters.
pub trait Messaging: Send + Sync + 'static {
    /// Start the adapter and return inbound message stream.
    fn start(&self) -> impl std::future::Future<Output = Result<InboundStream>> + Send;

    /// The bot's own user id. `None` until the gateway has connected.
    fn bot_user_id(&self) -> Option<UserId>;

    /// Send a response to a message.
    fn respond(
        &self,
        message: &InboundMessage,
        response: OutboundResponse,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Send a status update.
    fn send_status(
        &self,
        message: &InboundMessage,
        status: StatusUpdate,
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        let _ = (message, status);
        async { Ok(()) }
    }

    /// Health check.
    fn health_check(&self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Graceful shutdown.
    fn shutdown(&self) -> impl std::future::Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}
