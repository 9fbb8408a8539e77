//! Video model table.
//!
//! One row per supported model: provider, endpoint, accepted aspect ratios
//! and the fixed input parameters sent with every submission. Unknown model
//! names fall back to the default row.

use std::sync::LazyLock;

use serde_json::{Map, Value, json};

use crate::constants::video::DEFAULT_MODEL;
use crate::types::{AspectRatio, ProviderId};

/// Whether a model can be submitted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelAvailability {
    Available,
    /// Listed so requests for it fail clearly instead of silently falling back
    NotYetAvailable(&'static str),
}

#[derive(Debug, Clone)]
pub struct VideoModel {
    pub key: &'static str,
    pub aliases: &'static [&'static str],
    pub provider_id: &'static str,
    /// Provider endpoint (fal model path)
    pub endpoint: &'static str,
    pub aspect_ratios: &'static [AspectRatio],
    /// Whether `aspect_ratio` is part of the request input
    pub sends_aspect_ratio: bool,
    /// Fixed input parameters (duration, resolution, frame count, flags)
    pub parameters: Value,
    pub availability: ModelAvailability,
}

impl VideoModel {
    pub fn provider(&self) -> ProviderId {
        ProviderId::new(self.provider_id)
    }

    pub fn supports(&self, aspect_ratio: AspectRatio) -> bool {
        self.aspect_ratios.contains(&aspect_ratio)
    }

    pub fn is_available(&self) -> bool {
        self.availability == ModelAvailability::Available
    }

    /// Request input for one submission
    pub fn build_input(&self, prompt: &str, aspect_ratio: AspectRatio) -> Value {
        let mut input = Map::new();
        input.insert("prompt".to_string(), Value::String(prompt.to_string()));
        if self.sends_aspect_ratio {
            input.insert(
                "aspect_ratio".to_string(),
                Value::String(aspect_ratio.as_ratio().to_string()),
            );
        }
        if let Value::Object(params) = &self.parameters {
            for (key, value) in params {
                input.insert(key.clone(), value.clone());
            }
        }
        Value::Object(input)
    }

    fn matches_exactly(&self, name: &str) -> bool {
        self.key == name || self.aliases.contains(&name)
    }

    fn matches_loosely(&self, name: &str) -> bool {
        name.contains(self.key) || self.aliases.iter().any(|a| name.contains(a))
    }
}

static MODELS: LazyLock<Vec<VideoModel>> = LazyLock::new(|| {
    vec![
        VideoModel {
            key: "kling",
            aliases: &["kling-video"],
            provider_id: ProviderId::FAL,
            endpoint: "fal-ai/kling-video/v1.6/standard/text-to-video",
            aspect_ratios: &[AspectRatio::Landscape, AspectRatio::Portrait, AspectRatio::Square],
            sends_aspect_ratio: true,
            parameters: json!({"duration": "5"}),
            availability: ModelAvailability::Available,
        },
        VideoModel {
            key: "minimax",
            aliases: &["hailuo"],
            provider_id: ProviderId::FAL,
            endpoint: "fal-ai/minimax/video-01",
            aspect_ratios: &[AspectRatio::Landscape],
            sends_aspect_ratio: false,
            parameters: json!({"prompt_optimizer": true}),
            availability: ModelAvailability::Available,
        },
        VideoModel {
            key: "luma",
            aliases: &["dream-machine"],
            provider_id: ProviderId::FAL,
            endpoint: "fal-ai/luma-dream-machine",
            aspect_ratios: &[
                AspectRatio::Landscape,
                AspectRatio::Portrait,
                AspectRatio::Classic,
                AspectRatio::ClassicPortrait,
                AspectRatio::Ultrawide,
                AspectRatio::Square,
            ],
            sends_aspect_ratio: true,
            parameters: json!({"loop": false}),
            availability: ModelAvailability::Available,
        },
        VideoModel {
            key: "hunyuan",
            aliases: &[],
            provider_id: ProviderId::FAL,
            endpoint: "fal-ai/hunyuan-video",
            aspect_ratios: &[AspectRatio::Landscape, AspectRatio::Portrait],
            sends_aspect_ratio: true,
            parameters: json!({"resolution": "720p", "num_frames": 129}),
            availability: ModelAvailability::Available,
        },
        VideoModel {
            key: "google-veo",
            aliases: &["veo"],
            provider_id: "google",
            endpoint: "",
            aspect_ratios: &[AspectRatio::Landscape, AspectRatio::Portrait],
            sends_aspect_ratio: true,
            parameters: Value::Null,
            availability: ModelAvailability::NotYetAvailable(
                "Veo video generation is not yet offered through a supported provider",
            ),
        },
    ]
});

/// All rows of the model table
pub fn models() -> &'static [VideoModel] {
    &MODELS
}

fn default_model() -> &'static VideoModel {
    MODELS
        .iter()
        .find(|m| m.key == DEFAULT_MODEL)
        .unwrap_or(&MODELS[0])
}

/// Resolve a model name: exact key or alias, then substring, then the default
pub fn resolve_model(name: &str) -> &'static VideoModel {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return default_model();
    }

    MODELS
        .iter()
        .find(|m| m.matches_exactly(&name))
        .or_else(|| MODELS.iter().find(|m| m.matches_loosely(&name)))
        .unwrap_or_else(default_model)
}
