//! Image Provider Abstraction
//!
//! Defines the `ImageProvider` trait implemented by every synchronous image
//! generation adapter, plus the registry the fallback chain resolves ids against.
//!
//! ## Modules
//!
//! - `chain`: Deterministic fallback chain with an attempt log
//! - `preference`: Maps free-form provider preferences onto canonical ids
//! - `openai`, `stability`, `fal`: Vendor adapters

pub mod chain;
mod fal;
mod openai;
pub mod preference;
mod stability;

pub use chain::{AttemptOutcome, AttemptRecord, FallbackAttemptLog, ImageChain, ImageOutcome};
pub use fal::FalImageProvider;
pub use openai::OpenAiImageProvider;
pub use preference::resolve_preference;
pub use stability::StabilityImageProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::types::{AspectRatio, ProviderError, ProviderId, Result};

// =============================================================================
// Image Result
// =============================================================================

/// Image bytes or a reference to them, as returned by one adapter call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImagePayload {
    /// Hosted image URL
    Uri { uri: String },
    /// Inline base64 image data
    Inline { mime_type: String, base64: String },
}

impl ImagePayload {
    /// URL for hosted images, `data:` URI for inline bytes
    pub fn to_uri(&self) -> String {
        match self {
            Self::Uri { uri } => uri.clone(),
            Self::Inline { mime_type, base64 } => format!("data:{};base64,{}", mime_type, base64),
        }
    }
}

/// Output of exactly one successful adapter invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    pub provider_id: ProviderId,
    pub payload: ImagePayload,
    /// Provider-specific extras (model, seed, revised prompt, ...)
    #[serde(default)]
    pub metadata: Value,
}

// =============================================================================
// Image Provider Trait
// =============================================================================

/// Synchronous image generation adapter.
///
/// Implementations translate the canonical aspect ratio into their own
/// vocabulary and return `UnsupportedParameter` rather than substituting a
/// default. A missing credential is reported as `NotConfigured` without any
/// network call.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Canonical provider id
    fn id(&self) -> &str;

    /// Whether a credential is present
    fn is_configured(&self) -> bool;

    /// Generate one image
    async fn generate(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> std::result::Result<ImageResult, ProviderError>;
}

/// Shared image provider type for concurrent access
pub type SharedImageProvider = Arc<dyn ImageProvider>;

// =============================================================================
// Registry
// =============================================================================

/// Image adapters keyed by provider id
#[derive(Clone, Default)]
pub struct ImageProviderRegistry {
    providers: Vec<SharedImageProvider>,
}

impl std::fmt::Debug for ImageProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageProviderRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}

impl ImageProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adapter, replacing any previously registered one with the same id
    pub fn register(mut self, provider: SharedImageProvider) -> Self {
        self.providers.retain(|p| p.id() != provider.id());
        self.providers.push(provider);
        self
    }

    /// Find the adapter for an id; unknown ids count as not configured
    pub fn lookup(&self, id: &str) -> std::result::Result<SharedImageProvider, ProviderError> {
        self.providers
            .iter()
            .find(|p| p.id() == id)
            .cloned()
            .ok_or_else(|| ProviderError::not_configured(id, "no adapter registered"))
    }

    /// Registered ids in registration order
    pub fn ids(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| ProviderId::new(p.id())).collect()
    }

    /// Registered ids whose credentials are present
    pub fn configured_ids(&self) -> Vec<ProviderId> {
        self.providers
            .iter()
            .filter(|p| p.is_configured())
            .map(|p| ProviderId::new(p.id()))
            .collect()
    }
}

/// Build the registry of built-in image adapters from configuration
pub fn create_image_providers(config: &Config) -> Result<ImageProviderRegistry> {
    let timeout = config.image.timeout_secs;
    let providers = &config.providers;

    Ok(ImageProviderRegistry::new()
        .register(Arc::new(OpenAiImageProvider::new(&providers.openai, timeout)?))
        .register(Arc::new(StabilityImageProvider::new(&providers.stability, timeout)?))
        .register(Arc::new(FalImageProvider::new(&providers.fal, timeout)?)))
}
