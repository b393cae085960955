//! HTTP client for the Anthropic Messages API.
//!
//! Sends a role's full conversation history under its system prompt with
//! fixed sampling parameters, retries per [`RetryPolicy`], and pauses for a
//! courtesy delay after every successful call.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::conversation::Message;
use crate::dialectic::Completions;
use crate::retry::{call_with_retry, AttemptError, RetryPolicy};

/// Messages endpoint.
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
/// Pinned API version header.
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Model under study.
pub const DEFAULT_MODEL: &str = "claude-opus-4-20250514";

/// Sampling and transport settings for completion calls.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model identifier sent with every request
    pub model: String,
    /// Output token ceiling per call
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Whole-request timeout
    pub request_timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 400,
            temperature: 0.3,
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Request body for /v1/messages.
#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: &'a [Message],
}

/// Response from /v1/messages.
#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

/// A single content block in the response.
#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Client for the Messages endpoint.
#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    config: CompletionConfig,
    retry: RetryPolicy,
}

impl AnthropicClient {
    /// Create a new client. The key is passed in explicitly; reading it from
    /// the environment is the caller's concern.
    pub fn new(api_key: String, config: CompletionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_key,
            config,
            retry: RetryPolicy::default(),
        })
    }

    /// Issue one request, classifying failures for the retry policy.
    async fn send_once(
        &self,
        messages: &[Message],
        system_prompt: &str,
    ) -> std::result::Result<String, AttemptError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system: system_prompt,
            messages,
        };

        let response = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", self.api_key.as_str())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.into()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::Transport(e.into()))?;

        if !status.is_success() {
            return Err(AttemptError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&body).map_err(|e| AttemptError::Transport(e.into()))?;
        let Some(block) = parsed.content.first() else {
            return Err(AttemptError::Transport(anyhow::anyhow!(
                "response contained no content blocks"
            )));
        };

        Ok(block.text.trim().to_string())
    }
}

impl Completions for AnthropicClient {
    /// Send the full history under a system prompt and return the trimmed
    /// text of the first content block. Retries per the policy, then pauses
    /// for the courtesy delay before returning.
    async fn complete(&self, messages: &[Message], system_prompt: &str) -> Result<String> {
        let text = call_with_retry(&self.retry, "completion request", |_attempt| {
            self.send_once(messages, system_prompt)
        })
        .await?;

        tokio::time::sleep(self.retry.post_success_delay).await;
        Ok(text)
    }
}
