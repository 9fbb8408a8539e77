//! Structured analysis over a text model.
//!
//! Schema lookup happens before any network call, so an unknown kind never
//! reaches the provider.

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::ai::prompt::PromptTemplates;
use crate::ai::schema::lookup_schema;
use crate::ai::text::SharedTextProvider;
use crate::ai::validation::extract;
use crate::types::{GenError, Result};

const KEY_TAKEAWAYS: &str = "key_takeaways";

pub struct Analyzer {
    provider: SharedTextProvider,
}

impl Analyzer {
    pub fn new(provider: SharedTextProvider) -> Self {
        Self { provider }
    }

    /// Schema-hinted model call followed by extraction
    #[instrument(skip(self, content), fields(provider = self.provider.id(), bytes = content.len()))]
    pub async fn analyze(&self, kind: &str, content: &str) -> Result<Value> {
        let descriptor = lookup_schema(kind)?;
        if content.trim().is_empty() {
            return Err(GenError::unsupported("content", "<empty>"));
        }

        let prompt = PromptTemplates::analysis(descriptor, content).build();
        let response = self
            .provider
            .complete(&prompt, &descriptor.to_json_schema())
            .await?;

        info!(
            kind = descriptor.analysis_kind,
            model = %response.model,
            tokens = response.usage.total(),
            elapsed_ms = response.elapsed_ms,
            "Analysis completed"
        );

        extract(&response.content)
    }

    /// Takeaways as plain strings. Malformed model output yields an empty list.
    pub async fn key_takeaways(&self, content: &str) -> Result<Vec<String>> {
        match self.analyze(KEY_TAKEAWAYS, content).await {
            Ok(value) => Ok(takeaways_from(&value)),
            Err(GenError::MalformedOutput { reason, .. }) => {
                warn!(reason = %reason, "Discarding malformed takeaways output");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }
}

/// Accepts `{"takeaways": [...]}` or a bare array; non-string items are dropped
fn takeaways_from(value: &Value) -> Vec<String> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("takeaways") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::text::{TextProvider, TextResponse, TokenUsage};
    use crate::types::{ErrorCategory, ErrorCode, ProviderError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedText {
        reply: std::result::Result<String, ProviderError>,
        calls: AtomicUsize,
        last_schema: Mutex<Option<Value>>,
    }

    impl CannedText {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
                last_schema: Mutex::new(None),
            })
        }

        fn failing(err: ProviderError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                calls: AtomicUsize::new(0),
                last_schema: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl TextProvider for CannedText {
        fn id(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-1"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn complete(
            &self,
            _prompt: &str,
            schema: &Value,
        ) -> std::result::Result<TextResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_schema.lock().unwrap() = Some(schema.clone());
            self.reply.clone().map(|content| TextResponse {
                content,
                usage: TokenUsage::from_openai(10, 5),
                model: "canned-1".to_string(),
                elapsed_ms: 1,
            })
        }
    }

    #[tokio::test]
    async fn test_analyze_extracts_fenced_output_and_sends_schema() {
        let text = CannedText::replying("```json\n{\"title\": \"Phone Film\", \"meta_description\": \"d\", \"keywords\": []}\n```");
        let analyzer = Analyzer::new(text.clone());

        let value = analyzer.analyze("seo_metadata", "transcript").await.unwrap();
        assert_eq!(value["title"], "Phone Film");

        let schema = text.last_schema.lock().unwrap().clone().unwrap();
        assert_eq!(schema["title"], "seo_metadata");
    }

    #[tokio::test]
    async fn test_unknown_kind_rejected_before_call() {
        let text = CannedText::replying("{}");
        let analyzer = Analyzer::new(text.clone());

        let err = analyzer.analyze("horoscope", "transcript").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownAnalysisKind);
        assert_eq!(text.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analyze_surfaces_malformed_output() {
        let analyzer = Analyzer::new(CannedText::replying("{\"summary\": \"cut off"));
        let err = analyzer.analyze("content_analysis", "transcript").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedOutput);
    }

    #[tokio::test]
    async fn test_divergent_shape_passes_through() {
        let analyzer = Analyzer::new(CannedText::replying("{\"unexpected\": true}"));
        let value = analyzer.analyze("content_analysis", "transcript").await.unwrap();
        assert_eq!(value, json!({"unexpected": true}));
    }

    #[tokio::test]
    async fn test_key_takeaways_reads_object_form() {
        let analyzer = Analyzer::new(CannedText::replying(
            "{\"takeaways\": [\"Light matters\", \" \", 3, \"Sound matters more\"]}",
        ));
        let takeaways = analyzer.key_takeaways("transcript").await.unwrap();
        assert_eq!(takeaways, vec!["Light matters", "Sound matters more"]);
    }

    #[tokio::test]
    async fn test_key_takeaways_malformed_is_empty() {
        let analyzer = Analyzer::new(CannedText::replying("[\"one\", \"tw"));
        assert!(analyzer.key_takeaways("transcript").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_key_takeaways_propagates_provider_failure() {
        let analyzer = Analyzer::new(CannedText::failing(ProviderError::invocation(
            "canned",
            ErrorCategory::RateLimit,
            "slow down",
        )));
        let err = analyzer.key_takeaways("transcript").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvocationFailed);
    }

    #[test]
    fn test_takeaways_from_bare_array() {
        assert_eq!(takeaways_from(&json!(["a", "b"])), vec!["a", "b"]);
        assert!(takeaways_from(&json!("just text")).is_empty());
    }
}
