//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/reelsmith/) and project (.reelsmith/) level configuration.

use serde::{Deserialize, Serialize};

use crate::ai::video::models::{ModelAvailability, resolve_model};
use crate::constants::{chain, network, video};
use crate::types::{GenError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Per-provider credentials and endpoints
    pub providers: ProvidersConfig,

    /// Image fallback chain settings
    pub image: ImageConfig,

    /// Video job settings
    pub video: VideoConfig,

    /// Structured text (analysis) settings
    pub text: TextConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            providers: ProvidersConfig::default(),
            image: ImageConfig::default(),
            video: VideoConfig::default(),
            text: TextConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `GenError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.text.temperature) {
            return Err(GenError::Config(format!(
                "text.temperature must be between 0.0 and 2.0, got {}",
                self.text.temperature
            )));
        }

        for (name, secs) in [
            ("image.timeout_secs", self.image.timeout_secs),
            ("video.timeout_secs", self.video.timeout_secs),
            ("text.timeout_secs", self.text.timeout_secs),
        ] {
            if secs == 0 {
                return Err(GenError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if self.image.priority.is_empty() {
            return Err(GenError::Config(
                "image.priority must list at least one provider".to_string(),
            ));
        }
        if let Some(blank) = self.image.priority.iter().find(|p| p.trim().is_empty()) {
            return Err(GenError::Config(format!(
                "image.priority contains a blank provider id: {:?}",
                blank
            )));
        }

        let default_model = resolve_model(&self.video.default_model);
        if let ModelAvailability::NotYetAvailable(reason) = default_model.availability {
            return Err(GenError::Config(format!(
                "video.default_model '{}' cannot be the default: {}",
                self.video.default_model, reason
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Provider Credentials
// =============================================================================

/// Credentials and endpoints for every provider the core knows about
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: ProviderSettings,
    pub stability: ProviderSettings,
    pub fal: ProviderSettings,
}

/// Settings for one provider
///
/// Note: API keys are never serialized to output and are redacted in debug
/// output. Adapters convert the key to `SecretString` on construction.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// API key; falls back to the provider's conventional env var when absent
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for proxies or self-hosted gateways)
    pub api_base: Option<String>,
    /// Model override for synchronous image generation
    pub model: Option<String>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl ProviderSettings {
    /// Resolve the API key: explicit config first, then the given env var.
    /// Blank values count as absent.
    pub fn resolve_api_key(&self, env_var: &str) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(env_var).ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

// =============================================================================
// Image Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Fixed try-order after any preferred provider
    pub priority: Vec<String>,
    /// Request timeout per provider attempt
    pub timeout_secs: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            priority: chain::DEFAULT_PRIORITY
                .iter()
                .map(|p| p.to_string())
                .collect(),
            timeout_secs: network::IMAGE_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Video Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Model used when a submission names none
    pub default_model: String,
    /// Request timeout for submit and poll calls
    pub timeout_secs: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            default_model: video::DEFAULT_MODEL.to_string(),
            timeout_secs: network::VIDEO_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Text Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Chat model used for structured analysis
    pub model: String,
    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// Request timeout
    pub timeout_secs: u64,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            model: crate::constants::openai::DEFAULT_TEXT_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 2048,
            timeout_secs: network::TEXT_TIMEOUT_SECS,
        }
    }
}
