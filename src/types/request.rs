//! Generation requests.

use serde::{Deserialize, Serialize};

use super::aspect::AspectRatio;
use super::error::{GenError, Result};

/// What a request asks the providers to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Immutable description of one generation call.
///
/// Fields are private so a submitted request cannot be altered while an
/// orchestrator run or a video submission is using it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    kind: MediaKind,
    prompt: String,
    aspect_ratio: AspectRatio,
    preferred_provider: Option<String>,
}

impl GenerationRequest {
    /// Build a request, rejecting blank prompts before any provider is touched
    pub fn new(
        kind: MediaKind,
        prompt: impl Into<String>,
        aspect_ratio: AspectRatio,
        preferred_provider: Option<String>,
    ) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(GenError::unsupported("prompt", "<empty>"));
        }

        let preferred_provider = preferred_provider
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Ok(Self {
            kind,
            prompt,
            aspect_ratio,
            preferred_provider,
        })
    }

    pub fn image(prompt: impl Into<String>, aspect_ratio: AspectRatio) -> Result<Self> {
        Self::new(MediaKind::Image, prompt, aspect_ratio, None)
    }

    pub fn video(prompt: impl Into<String>, aspect_ratio: AspectRatio) -> Result<Self> {
        Self::new(MediaKind::Video, prompt, aspect_ratio, None)
    }

    /// Return a copy of this request naming a preferred provider
    pub fn preferring(self, provider: impl Into<String>) -> Result<Self> {
        Self::new(self.kind, self.prompt, self.aspect_ratio, Some(provider.into()))
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn preferred_provider(&self) -> Option<&str> {
        self.preferred_provider.as_deref()
    }
}
