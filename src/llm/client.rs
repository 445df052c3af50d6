//! OpenAI-compatible chat completions client.

use crate::config::LlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::completion::{ChatCompletion, CompletionRequest};

use anyhow::Context as _;
use std::time::Duration;

/// Holds the API key and a shared HTTP client for the completions endpoint.
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            endpoint: format!("{}/chat/completions", config.base_url),
            timeout: config.timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ChatCompletion for OpenAiClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<String, LlmError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|error| self.map_transport_error(error))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| self.map_transport_error(error))?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|value| value["error"]["message"].as_str().map(String::from))
                .unwrap_or_else(|| "unknown error".into());

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited(message));
            }
            return Err(LlmError::Status { status, message });
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|error| LlmError::MalformedResponse(error.to_string()))?;
        parse_openai_response(&value)
    }
}

impl OpenAiClient {
    fn map_transport_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Request(error)
        }
    }
}

/// Pull the first choice's text out of a chat completions body.
fn parse_openai_response(body: &serde_json::Value) -> std::result::Result<String, LlmError> {
    let choices = body["choices"]
        .as_array()
        .ok_or_else(|| LlmError::MalformedResponse("missing choices array".into()))?;

    let text = choices
        .first()
        .and_then(|choice| choice["message"]["content"].as_str())
        .map(str::trim)
        .unwrap_or_default();

    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    Ok(text.to_string())
}
