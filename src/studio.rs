//! Studio Facade
//!
//! Boundary operations of the orchestration core, wired from configuration.
//! Inputs arrive as plain strings and are validated here, before any
//! provider is contacted.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::ai::analysis::Analyzer;
use crate::ai::provider::{ImageChain, ImageOutcome, create_image_providers};
use crate::ai::schema::{SchemaDescriptor, lookup_schema};
use crate::ai::text::OpenAiTextProvider;
use crate::ai::validation::extract;
use crate::ai::video::{JobCoordinator, VideoJob, VideoStatus};
use crate::config::Config;
use crate::types::{AspectRatio, GenerationRequest, MediaKind, ProviderId, Result};

pub struct Studio {
    images: ImageChain,
    videos: JobCoordinator,
    analyzer: Analyzer,
}

impl Studio {
    pub fn new(images: ImageChain, videos: JobCoordinator, analyzer: Analyzer) -> Self {
        Self {
            images,
            videos,
            analyzer,
        }
    }

    /// Build every adapter from configuration. Missing credentials are not an
    /// error here; they surface as `NotConfigured` when a provider is used.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let registry = create_image_providers(config)?;
        let images = ImageChain::new(registry, config.image.priority.iter().map(String::as_str));
        let videos = JobCoordinator::from_config(config)?;
        let text = OpenAiTextProvider::new(&config.providers.openai, &config.text)?;

        let studio = Self::new(images, videos, Analyzer::new(Arc::new(text)));
        debug!(configured = ?studio.configured_image_providers(), "Studio ready");
        Ok(studio)
    }

    /// Generate one image through the fallback chain
    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &str,
        preferred_provider: Option<&str>,
    ) -> Result<ImageOutcome> {
        let aspect_ratio: AspectRatio = aspect_ratio.parse()?;
        let request = GenerationRequest::new(
            MediaKind::Image,
            prompt,
            aspect_ratio,
            preferred_provider.map(String::from),
        )?;

        let outcome = self.images.resolve(&request).await?;
        info!(provider = %outcome.provider_id(), "Image generated");
        Ok(outcome)
    }

    /// Submit a video job; `model` falls back to the configured default
    pub async fn submit_video(
        &self,
        prompt: &str,
        aspect_ratio: &str,
        model: Option<&str>,
    ) -> Result<VideoJob> {
        let aspect_ratio: AspectRatio = aspect_ratio.parse()?;
        let request = GenerationRequest::video(prompt, aspect_ratio)?;
        self.videos.submit(&request, model).await
    }

    /// Refresh a caller-held job in place
    pub async fn refresh_video(&self, job: &mut VideoJob) -> Result<VideoStatus> {
        self.videos.poll(job).await?;
        Ok(job.status())
    }

    /// Status of a job known only by its identifiers
    pub async fn poll_video(&self, provider_id: &str, job_id: &str) -> Result<VideoStatus> {
        self.videos
            .poll_by_id(&ProviderId::new(provider_id.trim()), job_id.trim())
            .await
    }

    pub fn extract_structured(&self, raw_text: &str) -> Result<Value> {
        extract(raw_text)
    }

    pub fn lookup_schema(&self, kind: &str) -> Result<&'static SchemaDescriptor> {
        lookup_schema(kind)
    }

    pub async fn analyze(&self, kind: &str, content: &str) -> Result<Value> {
        self.analyzer.analyze(kind, content).await
    }

    pub async fn key_takeaways(&self, content: &str) -> Result<Vec<String>> {
        self.analyzer.key_takeaways(content).await
    }

    /// Image providers whose credentials are present
    pub fn configured_image_providers(&self) -> Vec<ProviderId> {
        self.images.registry().configured_ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{
        AttemptOutcome, ImagePayload, ImageProvider, ImageProviderRegistry, ImageResult,
    };
    use crate::ai::text::{TextProvider, TextResponse};
    use crate::ai::video::{JobState, VideoModel, VideoProvider};
    use crate::types::{ErrorCode, ProviderError};
    use async_trait::async_trait;

    struct FixedImage {
        id: &'static str,
        configured: bool,
    }

    #[async_trait]
    impl ImageProvider for FixedImage {
        fn id(&self) -> &str {
            self.id
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn generate(
            &self,
            _prompt: &str,
            _aspect_ratio: AspectRatio,
        ) -> std::result::Result<ImageResult, ProviderError> {
            Ok(ImageResult {
                provider_id: ProviderId::new(self.id),
                payload: ImagePayload::Inline {
                    mime_type: "image/png".to_string(),
                    base64: "AAAA".to_string(),
                },
                metadata: Value::Null,
            })
        }
    }

    struct InstantQueue;

    #[async_trait]
    impl VideoProvider for InstantQueue {
        fn id(&self) -> &str {
            "fal"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn submit(
            &self,
            model: &VideoModel,
            _prompt: &str,
            _aspect_ratio: AspectRatio,
        ) -> std::result::Result<String, ProviderError> {
            Ok(format!("fal-ai/{}/requests/r1", model.key))
        }

        async fn status(&self, job_id: &str) -> std::result::Result<VideoStatus, ProviderError> {
            Ok(VideoStatus::succeeded(format!("https://cdn/{}.mp4", job_id.len())))
        }
    }

    struct EchoText;

    #[async_trait]
    impl TextProvider for EchoText {
        fn id(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn complete(
            &self,
            _prompt: &str,
            _schema: &Value,
        ) -> std::result::Result<TextResponse, ProviderError> {
            Ok(TextResponse {
                content: "{\"takeaways\": [\"Keep it short\"]}".to_string(),
                usage: Default::default(),
                model: "echo".to_string(),
                elapsed_ms: 0,
            })
        }
    }

    fn studio(configured: [bool; 3]) -> Studio {
        let registry = ImageProviderRegistry::new()
            .register(Arc::new(FixedImage { id: "openai", configured: configured[0] }))
            .register(Arc::new(FixedImage { id: "stability", configured: configured[1] }))
            .register(Arc::new(FixedImage { id: "fal", configured: configured[2] }));

        Studio::new(
            ImageChain::with_default_priority(registry),
            JobCoordinator::new("kling").register(Arc::new(InstantQueue)),
            Analyzer::new(Arc::new(EchoText)),
        )
    }

    #[tokio::test]
    async fn test_stability_label_resolves_to_stability() {
        let outcome = studio([true, true, true])
            .generate_image("a tide pool", "16:9", Some("stability-core"))
            .await
            .unwrap();
        assert_eq!(outcome.provider_id(), &ProviderId::stability());
        assert_eq!(outcome.attempts.len(), 1);
        assert!(outcome.image_uri().starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_unknown_label_with_nothing_configured() {
        let err = studio([false, false, false])
            .generate_image("a tide pool", "1:1", Some("xyz"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::NoProviderConfigured);
        let records = err.attempts().unwrap().records();
        assert_eq!(records[0].provider_id, ProviderId::new("xyz"));
        assert!(records.iter().all(|r| matches!(r.outcome, AttemptOutcome::Skipped(_))));
    }

    #[tokio::test]
    async fn test_bad_aspect_rejected_before_any_provider() {
        let err = studio([true, true, true])
            .generate_image("a tide pool", "5:4", None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedParameter);
        assert!(err.attempts().is_none());
    }

    #[tokio::test]
    async fn test_video_submit_then_poll_by_id() {
        let studio = studio([false, false, false]);
        let mut job = studio.submit_video("a glacier", "landscape", None).await.unwrap();
        assert_eq!(job.state, JobState::Queued);

        let status = studio.poll_video(job.provider_id.as_str(), &job.job_id).await.unwrap();
        assert_eq!(status.state, JobState::Succeeded);

        let refreshed = studio.refresh_video(&mut job).await.unwrap();
        assert_eq!(refreshed, job.status());
        assert!(job.is_terminal());
    }

    #[tokio::test]
    async fn test_google_veo_unavailable() {
        let err = studio([true, true, true])
            .submit_video("a glacier", "16:9", Some("google-veo"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProviderUnavailable);
    }

    #[tokio::test]
    async fn test_takeaways_through_facade() {
        let takeaways = studio([false, false, false]).key_takeaways("transcript").await.unwrap();
        assert_eq!(takeaways, vec!["Keep it short"]);
    }

    #[test]
    fn test_configured_providers_listed() {
        assert_eq!(
            studio([false, true, true]).configured_image_providers(),
            vec![ProviderId::stability(), ProviderId::fal()]
        );
    }

    #[test]
    fn test_from_default_config_builds() {
        assert!(Studio::from_config(&Config::default()).is_ok());
    }
}
