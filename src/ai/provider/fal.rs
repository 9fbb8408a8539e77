//! fal.ai Image Provider
//!
//! Synchronous `fal.run/{model}` calls (Flux by default). Aspect ratios map
//! onto fal's named `image_size` presets.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::{ImagePayload, ImageProvider, ImageResult};
use crate::ai::http;
use crate::config::ProviderSettings;
use crate::constants::fal::{API_KEY_ENV, DEFAULT_IMAGE_MODEL, DEFAULT_RUN_BASE};
use crate::types::{AspectRatio, ErrorCategory, ProviderError, ProviderId, Result};

pub struct FalImageProvider {
    api_key: Option<SecretString>,
    run_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for FalImageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FalImageProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("run_base", &self.run_base)
            .field("model", &self.model)
            .finish()
    }
}

impl FalImageProvider {
    pub fn new(settings: &ProviderSettings, timeout_secs: u64) -> Result<Self> {
        let run_base = http::normalize_base_url(
            ProviderId::FAL,
            settings.api_base.as_deref().unwrap_or(DEFAULT_RUN_BASE),
        )?;

        Ok(Self {
            api_key: settings.resolve_api_key(API_KEY_ENV).map(SecretString::from),
            run_base,
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            client: http::build_client(timeout_secs)?,
        })
    }

    /// Named `image_size` preset for an aspect ratio
    pub fn preset_for(aspect_ratio: AspectRatio) -> std::result::Result<&'static str, ProviderError> {
        match aspect_ratio {
            AspectRatio::Square => Ok("square_hd"),
            AspectRatio::Landscape => Ok("landscape_16_9"),
            AspectRatio::Portrait => Ok("portrait_16_9"),
            AspectRatio::Classic => Ok("landscape_4_3"),
            AspectRatio::ClassicPortrait => Ok("portrait_4_3"),
            other => Err(ProviderError::unsupported(
                ProviderId::FAL,
                "aspect_ratio",
                other.as_ratio(),
            )),
        }
    }
}

#[async_trait]
impl ImageProvider for FalImageProvider {
    fn id(&self) -> &str {
        ProviderId::FAL
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
        let image_size = Self::preset_for(aspect_ratio)?;

        info!("Generating image with fal (model: {}, size: {})", self.model, image_size);

        let url = format!("{}/{}", self.run_base, self.model);
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Key {}", api_key.expose_secret()))
            .json(&FalImageRequest {
                prompt,
                image_size,
                num_images: 1,
            });

        let body: FalImageResponse = http::send_json(self.id(), request).await?;
        debug!(images = body.images.len(), "Received fal image response");

        let image = body.images.into_iter().next().ok_or_else(|| {
            ProviderError::invocation(self.id(), ErrorCategory::ParseError, "response contained no images")
        })?;

        Ok(ImageResult {
            provider_id: ProviderId::fal(),
            payload: ImagePayload::Uri { uri: image.url },
            metadata: json!({
                "model": self.model,
                "image_size": image_size,
                "width": image.width,
                "height": image.height,
                "seed": body.seed,
            }),
        })
    }
}

#[derive(Debug, Serialize)]
struct FalImageRequest<'a> {
    prompt: &'a str,
    image_size: &'a str,
    num_images: u8,
}

#[derive(Debug, Deserialize)]
struct FalImageResponse {
    #[serde(default)]
    images: Vec<FalImage>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FalImage {
    url: String,
    width: Option<u32>,
    height: Option<u32>,
}
