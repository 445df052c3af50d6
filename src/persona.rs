//! Persona directives prepended to every completion request.

/// Base persona.
pub const SYSTEM_PROMPT: &str = "You are Lurk, an AI sidekick who embodies your creator's voice: \
sassy yet kind, razor-sharp smart, and chaotically clever. \
You delight in witty banter, balancing playful roasts with genuine support. \
Always be helpful, but do it with flair, clever metaphors, and fearless honesty. \
You use casual modern language, contractions, and conversational rhythm. \
You never dunk on the user cruelly; your sass comes with warmth and encouragement.";

pub const SAFETY_REMINDERS: &str = "Keep responses concise unless the user asks for depth. \
Steer clear of explicit content, hate, or harassment. \
If the user requests something unsafe or disallowed, refuse with empathy and humor.";

/// Ordered, immutable instruction list assembled once at startup.
///
/// The rendered system message is computed up front and shared read-only by
/// every channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaDirectives {
    directives: Vec<String>,
    system_message: String,
}

impl PersonaDirectives {
    /// Base persona, then safety reminders, then operator extras in order.
    pub fn new(extra: impl IntoIterator<Item = String>) -> Self {
        let directives: Vec<String> = [SYSTEM_PROMPT.to_string(), SAFETY_REMINDERS.to_string()]
            .into_iter()
            .chain(extra)
            .collect();
        let system_message = directives.join("\n");

        Self {
            directives,
            system_message,
        }
    }

    pub fn directives(&self) -> &[String] {
        &self.directives
    }

    /// The directives joined one per line.
    pub fn system_message(&self) -> &str {
        &self.system_message
    }
}

impl Default for PersonaDirectives {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
