//! Chat completion collaborator: request types, trait seam, and the HTTP client.

pub mod client;
pub mod completion;

pub use client::OpenAiClient;
pub use completion::{ChatCompletion, ChatMessage, CompletionRequest};
