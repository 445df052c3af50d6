//! Configuration loading and validation.

use crate::error::{ConfigError, Result};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_CONTEXT_TURNS: usize = 6;
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_COMMAND_PREFIX: &str = "!";

/// Separator between entries of `SYSTEM_DIRECTIVES`.
pub const DIRECTIVE_SEPARATOR: &str = "||";

/// Top-level Lurk configuration.
#[derive(Clone)]
pub struct Config {
    /// Messaging platform credentials.
    pub discord: DiscordConfig,
    /// Completion endpoint credentials and sampling parameters.
    pub llm: LlmConfig,
    /// Number of user+assistant exchanges kept per channel.
    pub max_context_turns: usize,
    /// Operator-supplied directives appended to the persona.
    pub system_directives: Vec<String>,
    /// Prefix for text commands such as `!reset`.
    pub command_prefix: String,
}

#[derive(Clone)]
pub struct DiscordConfig {
    pub token: String,
}

#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[redacted]")
            .field("api_key", &"[redacted]")
            .field("model", &self.llm.model)
            .field("temperature", &self.llm.temperature)
            .field("base_url", &self.llm.base_url)
            .field("timeout", &self.llm.timeout)
            .field("max_context_turns", &self.max_context_turns)
            .field("system_directives", &self.system_directives)
            .field("command_prefix", &self.command_prefix)
            .finish()
    }
}

impl Config {
    /// Load from process environment, reading a `.env` file first if present.
    pub fn load_from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;

        let model = get("OPENAI_MODEL")
            .map(|model| model.trim().to_string())
            .unwrap_or_else(|| DEFAULT_MODEL.into());

        let max_context_turns = match get("MAX_CONTEXT_TURNS") {
            Some(value) => parse_integer("MAX_CONTEXT_TURNS", &value)?.max(1) as usize,
            None => DEFAULT_MAX_CONTEXT_TURNS,
        };

        let temperature = match get("OPENAI_TEMPERATURE") {
            Some(value) => parse_float("OPENAI_TEMPERATURE", &value)?,
            None => DEFAULT_TEMPERATURE,
        };

        let timeout_secs = match get("COMPLETION_TIMEOUT_SECS") {
            Some(value) => parse_integer("COMPLETION_TIMEOUT_SECS", &value)?.max(1) as u64,
            None => DEFAULT_COMPLETION_TIMEOUT_SECS,
        };

        let base_url = get("OPENAI_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());

        let command_prefix = get("COMMAND_PREFIX")
            .map(|prefix| prefix.trim().to_string())
            .unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.into());

        let system_directives = lookup("SYSTEM_DIRECTIVES")
            .map(|raw| parse_directives(&raw))
            .unwrap_or_default();

        Ok(Self {
            discord: DiscordConfig { token },
            llm: LlmConfig {
                api_key,
                model,
                temperature,
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            max_context_turns,
            system_directives,
            command_prefix,
        })
    }
}

/// Split `SYSTEM_DIRECTIVES` on the separator, dropping blank entries.
pub fn parse_directives(raw: &str) -> Vec<String> {
    raw.split(DIRECTIVE_SEPARATOR)
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .map(String::from)
        .collect()
}

fn parse_integer(name: &'static str, value: &str) -> std::result::Result<i64, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::InvalidInteger {
            name,
            value: value.to_string(),
        })
}

fn parse_float(name: &'static str, value: &str) -> std::result::Result<f32, ConfigError> {
    value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .ok_or_else(|| ConfigError::InvalidFloat {
            name,
            value: value.to_string(),
        })
}
