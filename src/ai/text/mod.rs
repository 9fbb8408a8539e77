//! Text Model Abstraction
//!
//! Schema-hinted text generation used by the analysis layer. Providers return
//! raw model text; turning it into structured data is the extractor's job.

mod openai;
mod prompt_utils;

pub use openai::OpenAiTextProvider;
pub use prompt_utils::build_schema_prompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::types::ProviderError;

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    /// Create from OpenAI-style usage response
    pub fn from_openai(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            input_tokens: prompt_tokens,
            output_tokens: completion_tokens,
        }
    }
}

/// Raw model reply with usage metrics
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub model: String,
    pub elapsed_ms: u64,
}

#[async_trait]
pub trait TextProvider: Send + Sync {
    fn id(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    fn is_configured(&self) -> bool;

    /// Generate text that should match `schema` (a JSON Schema value, or null)
    async fn complete(&self, prompt: &str, schema: &Value) -> Result<TextResponse, ProviderError>;
}

pub type SharedTextProvider = Arc<dyn TextProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_from_openai() {
        let usage = TokenUsage::from_openai(100, 50);
        assert_eq!(usage.input_tokens, 100);
        assert_eq!(usage.output_tokens, 50);
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn test_token_usage_total_saturates() {
        let usage = TokenUsage::from_openai(u32::MAX, 10);
        assert_eq!(usage.total(), u32::MAX);
    }
}
