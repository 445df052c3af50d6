//! Operator text commands.

use crate::UserId;

/// Commands recognized ahead of the engagement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Clear the invoking channel's history.
    Reset,
}

impl Command {
    fn from_word(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("reset") {
            Some(Command::Reset)
        } else {
            None
        }
    }
}

/// Parse `<prefix>reset` or `<@bot> reset` from raw message content.
///
/// The command word matches case-insensitively (`!RESET` works). Commands take
/// no arguments, and unlike discord.py-style command routers, which are
/// case-sensitive and drop trailing words, anything after the command word
/// means the message is ordinary chat (`!reset now` is not a reset).
pub fn parse(content: &str, prefix: &str, bot_user_id: Option<UserId>) -> Option<Command> {
    let content = content.trim();

    if !prefix.is_empty() {
        if let Some(rest) = content.strip_prefix(prefix) {
            return Command::from_word(rest);
        }
    }

    let bot_user_id = bot_user_id?;
    let rest = strip_leading_mention(content, bot_user_id)?;
    Command::from_word(rest.trim_start())
}

fn strip_leading_mention(content: &str, bot_user_id: UserId) -> Option<&str> {
    let plain = format!("<@{bot_user_id}>");
    let nick = format!("<@!{bot_user_id}>");
    content
        .strip_prefix(plain.as_str())
        .or_else(|| content.strip_prefix(nick.as_str()))
        // Mention must be followed by whitespace before the command word
        .filter(|rest| rest.starts_with(char::is_whitespace))
}
