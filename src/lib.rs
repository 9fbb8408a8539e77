//! Reelsmith - Generative Media Orchestration Core
//!
//! Provider-agnostic image and video generation for content-creation tools,
//! plus structured output handling for text-model analysis.
//!
//! ## Core Features
//!
//! - **Image Fallback Chain**: OpenAI, Stability AI and fal.ai behind one
//!   interface, tried in a deterministic order with a full attempt log
//! - **Queued Video Jobs**: submit once, poll by `(provider_id, job_id)`
//! - **Structured Output**: JSON extraction from fenced or chatty model replies
//! - **Schema Registry**: named analysis kinds with JSON Schema descriptors
//!
//! ## Quick Start
//!
//! ```ignore
//! use reelsmith::{ConfigLoader, Studio};
//!
//! let studio = Studio::from_config(&ConfigLoader::load()?)?;
//! let outcome = studio.generate_image("a lighthouse at dusk", "16:9", Some("flux")).await?;
//! println!("{}", outcome.image_uri());
//!
//! let job = studio.submit_video("waves on basalt", "16:9", Some("kling")).await?;
//! let status = studio.poll_video(job.provider_id.as_str(), &job.job_id).await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: Provider adapters, fallback chain, video jobs, extraction, schemas
//! - [`config`]: Layered configuration
//! - [`studio`]: Facade wiring everything from configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod studio;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorBody, ErrorCategory, ErrorCode, GenError, ProviderError, Result};

// Request Types
pub use types::{AspectRatio, GenerationRequest, MediaKind, ProviderId};

// Facade
pub use studio::Studio;

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    // Structured output
    Analyzer,
    // Image chain
    AttemptOutcome,
    FallbackAttemptLog,
    ImageChain,
    ImageOutcome,
    ImageProvider,
    ImageProviderRegistry,
    // Video
    JobCoordinator,
    JobState,
    SchemaDescriptor,
    TextProvider,
    VideoJob,
    VideoProvider,
    VideoStatus,
    extract,
    lookup_schema,
};
