//! OpenAI Chat Provider
//!
//! Structured text through OpenAI's Chat Completions API with
//! `response_format = json_object`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info};

use super::{TextProvider, TextResponse, TokenUsage, build_schema_prompt};
use crate::ai::http;
use crate::config::{ProviderSettings, TextConfig};
use crate::constants::openai::{API_KEY_ENV, DEFAULT_API_BASE};
use crate::types::{ErrorCategory, ProviderError, ProviderId, Result};

const SYSTEM_PROMPT: &str =
    "You are a content strategist for video and social media creators. Always respond with valid JSON.";

/// OpenAI chat provider with secure API key handling
pub struct OpenAiTextProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: Option<SecretString>,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiTextProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiTextProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiTextProvider {
    pub fn new(settings: &ProviderSettings, text: &TextConfig) -> Result<Self> {
        let api_base = http::normalize_base_url(
            ProviderId::OPENAI,
            settings.api_base.as_deref().unwrap_or(DEFAULT_API_BASE),
        )?;

        Ok(Self {
            api_key: settings.resolve_api_key(API_KEY_ENV).map(SecretString::from),
            api_base,
            model: text.model.clone(),
            temperature: text.temperature,
            max_tokens: text.max_tokens,
            client: http::build_client(text.timeout_secs)?,
        })
    }

    fn build_request(&self, prompt: &str, schema: &Value) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_schema_prompt(prompt, schema),
                },
            ],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }
}

#[async_trait]
impl TextProvider for OpenAiTextProvider {
    fn id(&self) -> &str {
        ProviderId::OPENAI
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, prompt: &str, schema: &Value) -> std::result::Result<TextResponse, ProviderError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::not_configured(self.id(), format!("{} not set", API_KEY_ENV)))?;

        info!(
            "Generating with OpenAI (model: {}, temperature: {})",
            self.model, self.temperature
        );

        let start_time = Instant::now();
        let url = format!("{}/chat/completions", self.api_base);
        let request = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(&self.build_request(prompt, schema));

        let body: ChatCompletionResponse = http::send_json(self.id(), request).await?;
        let elapsed = start_time.elapsed();

        let usage = body
            .usage
            .map(|u| TokenUsage::from_openai(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::invocation(self.id(), ErrorCategory::ParseError, "no content in response")
            })?;

        debug!(
            tokens = usage.total(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Received response from OpenAI"
        );

        Ok(TextResponse {
            content,
            usage,
            model: self.model.clone(),
            elapsed_ms: elapsed.as_millis() as u64,
        })
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}
