//! Global Constants
//!
//! Centralized constants for endpoints, defaults and tuning.

/// Image fallback chain constants
pub mod chain {
    /// Default try-order when no preference is given
    pub const DEFAULT_PRIORITY: [&str; 3] = ["openai", "stability", "fal"];

    /// Reason recorded for candidates skipped without a real attempt
    pub const SKIPPED_NOT_CONFIGURED: &str = "not configured";
}

/// OpenAI endpoints and defaults
pub mod openai {
    pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
    pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
    pub const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";
    pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
}

/// Stability AI endpoints and defaults
pub mod stability {
    pub const DEFAULT_API_BASE: &str = "https://api.stability.ai";
    pub const CORE_PATH: &str = "/v2beta/stable-image/generate/core";
    pub const DEFAULT_OUTPUT_FORMAT: &str = "png";
    pub const API_KEY_ENV: &str = "STABILITY_API_KEY";
}

/// fal.ai endpoints and defaults
pub mod fal {
    /// Synchronous run endpoint (images)
    pub const DEFAULT_RUN_BASE: &str = "https://fal.run";
    /// Queue endpoint (video)
    pub const DEFAULT_QUEUE_BASE: &str = "https://queue.fal.run";
    pub const DEFAULT_IMAGE_MODEL: &str = "fal-ai/flux/schnell";
    pub const API_KEY_ENV: &str = "FAL_KEY";
}

/// Video job constants
pub mod video {
    /// Model used when the requested identifier matches nothing in the table
    pub const DEFAULT_MODEL: &str = "kling";
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout for synchronous image generation (seconds)
    pub const IMAGE_TIMEOUT_SECS: u64 = 120;

    /// Default request timeout for queue submit/poll calls (seconds)
    pub const VIDEO_TIMEOUT_SECS: u64 = 30;

    /// Default request timeout for text model calls (seconds)
    pub const TEXT_TIMEOUT_SECS: u64 = 120;

    /// Maximum characters of an upstream error body kept in messages
    pub const ERROR_BODY_PREVIEW_CHARS: usize = 500;
}
