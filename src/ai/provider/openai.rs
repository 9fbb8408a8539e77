//! OpenAI Images Provider
//!
//! Image generation through OpenAI's Images API (`/images/generations`).
//! Aspect ratios map onto the fixed pixel sizes the API accepts.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::{ImagePayload, ImageProvider, ImageResult};
use crate::ai::http;
use crate::config::ProviderSettings;
use crate::constants::openai::{API_KEY_ENV, DEFAULT_API_BASE, DEFAULT_IMAGE_MODEL};
use crate::types::{AspectRatio, ErrorCategory, ProviderError, ProviderId, Result};

/// OpenAI image provider with secure API key handling
pub struct OpenAiImageProvider {
    /// Absent when neither config nor `OPENAI_API_KEY` supplies a key
    api_key: Option<SecretString>,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiImageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiImageProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiImageProvider {
    pub fn new(settings: &ProviderSettings, timeout_secs: u64) -> Result<Self> {
        let api_base = http::normalize_base_url(
            ProviderId::OPENAI,
            settings.api_base.as_deref().unwrap_or(DEFAULT_API_BASE),
        )?;

        Ok(Self {
            api_key: settings.resolve_api_key(API_KEY_ENV).map(SecretString::from),
            api_base,
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            client: http::build_client(timeout_secs)?,
        })
    }

    /// Pixel size for an aspect ratio
    pub fn size_for(aspect_ratio: AspectRatio) -> std::result::Result<&'static str, ProviderError> {
        match aspect_ratio {
            AspectRatio::Square => Ok("1024x1024"),
            AspectRatio::Landscape => Ok("1792x1024"),
            AspectRatio::Portrait => Ok("1024x1792"),
            other => Err(ProviderError::unsupported(
                ProviderId::OPENAI,
                "aspect_ratio",
                other.as_ratio(),
            )),
        }
    }

    fn build_request<'a>(&'a self, prompt: &'a str, size: &'a str) -> ImageGenerationRequest<'a> {
        ImageGenerationRequest {
            model: &self.model,
            prompt,
            n: 1,
            size,
        }
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageProvider {
    fn id(&self) -> &str {
        ProviderId::OPENAI
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
        let size = Self::size_for(aspect_ratio)?;

        info!("Generating image with OpenAI (model: {}, size: {})", self.model, size);

        let url = format!("{}/images/generations", self.api_base);
        let request = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(&self.build_request(prompt, size));

        let body: ImageGenerationResponse = http::send_json(self.id(), request).await?;
        debug!(images = body.data.len(), "Received OpenAI image response");

        let image = body.data.into_iter().next().ok_or_else(|| {
            ProviderError::invocation(self.id(), ErrorCategory::ParseError, "response contained no images")
        })?;

        let payload = match (image.url, image.b64_json) {
            (Some(uri), _) => ImagePayload::Uri { uri },
            (None, Some(base64)) => ImagePayload::Inline {
                mime_type: "image/png".to_string(),
                base64,
            },
            (None, None) => {
                return Err(ProviderError::invocation(
                    self.id(),
                    ErrorCategory::ParseError,
                    "image entry has neither url nor b64_json",
                ));
            }
        };

        Ok(ImageResult {
            provider_id: ProviderId::openai(),
            payload,
            metadata: json!({
                "model": self.model,
                "size": size,
                "revised_prompt": image.revised_prompt,
            }),
        })
    }
}

// =============================================================================
// OpenAI API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
    b64_json: Option<String>,
    revised_prompt: Option<String>,
}
