//! Stability AI Provider
//!
//! Stable Image Core endpoint. The request is multipart form data and the
//! image comes back inline as base64 when `Accept: application/json` is sent.

use async_trait::async_trait;
use reqwest::multipart::Form;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{ImagePayload, ImageProvider, ImageResult};
use crate::ai::http;
use crate::config::ProviderSettings;
use crate::constants::stability::{API_KEY_ENV, CORE_PATH, DEFAULT_API_BASE, DEFAULT_OUTPUT_FORMAT};
use crate::types::{AspectRatio, ErrorCategory, ProviderError, ProviderId, Result};

pub struct StabilityImageProvider {
    api_key: Option<SecretString>,
    api_base: String,
    output_format: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for StabilityImageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StabilityImageProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("output_format", &self.output_format)
            .finish()
    }
}

impl StabilityImageProvider {
    pub fn new(settings: &ProviderSettings, timeout_secs: u64) -> Result<Self> {
        let api_base = http::normalize_base_url(
            ProviderId::STABILITY,
            settings.api_base.as_deref().unwrap_or(DEFAULT_API_BASE),
        )?;

        Ok(Self {
            api_key: settings.resolve_api_key(API_KEY_ENV).map(SecretString::from),
            api_base,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            client: http::build_client(timeout_secs)?,
        })
    }

    /// Raw ratio string accepted by the Core endpoint
    pub fn ratio_for(aspect_ratio: AspectRatio) -> std::result::Result<&'static str, ProviderError> {
        match aspect_ratio {
            AspectRatio::Square
            | AspectRatio::Landscape
            | AspectRatio::Portrait
            | AspectRatio::Photo
            | AspectRatio::PhotoPortrait
            | AspectRatio::Ultrawide => Ok(aspect_ratio.as_ratio()),
            other => Err(ProviderError::unsupported(
                ProviderId::STABILITY,
                "aspect_ratio",
                other.as_ratio(),
            )),
        }
    }

    fn build_form(&self, prompt: &str, ratio: &'static str) -> Form {
        Form::new()
            .text("prompt", prompt.to_string())
            .text("aspect_ratio", ratio)
            .text("output_format", self.output_format.clone())
    }
}

#[async_trait]
impl ImageProvider for StabilityImageProvider {
    fn id(&self) -> &str {
        ProviderId::STABILITY
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> std::result::Result<ImageResult, ProviderError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::not_configured(self.id(), format!("{} not set", API_KEY_ENV)))?;
        let ratio = Self::ratio_for(aspect_ratio)?;

        info!("Generating image with Stability Core (aspect: {})", ratio);

        let url = format!("{}{}", self.api_base, CORE_PATH);
        let request = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .header("Accept", "application/json")
            .multipart(self.build_form(prompt, ratio));

        let body: CoreResponse = http::send_json(self.id(), request).await?;
        debug!(finish_reason = ?body.finish_reason, seed = ?body.seed, "Received Stability response");

        if body.finish_reason.as_deref() == Some("CONTENT_FILTERED") {
            warn!("Stability filtered the generated image");
            return Err(ProviderError::invocation(
                self.id(),
                ErrorCategory::ContentPolicy,
                "image was filtered by the content policy",
            ));
        }

        let base64 = body.image.filter(|b| !b.is_empty()).ok_or_else(|| {
            ProviderError::invocation(self.id(), ErrorCategory::ParseError, "response contained no image")
        })?;

        Ok(ImageResult {
            provider_id: ProviderId::stability(),
            payload: ImagePayload::Inline {
                mime_type: format!("image/{}", self.output_format),
                base64,
            },
            metadata: json!({
                "aspect_ratio": ratio,
                "seed": body.seed,
                "finish_reason": body.finish_reason,
            }),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CoreResponse {
    image: Option<String>,
    finish_reason: Option<String>,
    seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_vocabulary() {
        for aspect in [
            AspectRatio::Square,
            AspectRatio::Landscape,
            AspectRatio::Portrait,
            AspectRatio::Photo,
            AspectRatio::PhotoPortrait,
            AspectRatio::Ultrawide,
        ] {
            assert_eq!(StabilityImageProvider::ratio_for(aspect).unwrap(), aspect.as_ratio());
        }
        assert!(StabilityImageProvider::ratio_for(AspectRatio::Classic).is_err());
        assert!(StabilityImageProvider::ratio_for(AspectRatio::ClassicPortrait).is_err());
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let provider = StabilityImageProvider {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            output_format: "png".to_string(),
            client: reqwest::Client::new(),
        };

        let err = provider.generate("a fox", AspectRatio::Landscape).await.unwrap_err();
        assert!(err.is_not_configured());
        assert_eq!(err.provider(), "stability");
    }

    #[test]
    fn test_core_response_parses() {
        let body: CoreResponse =
            serde_json::from_str(r#"{"image": "iVBOR", "finish_reason": "SUCCESS", "seed": 42}"#).unwrap();
        assert_eq!(body.image.as_deref(), Some("iVBOR"));
        assert_eq!(body.seed, Some(42));
    }
}
