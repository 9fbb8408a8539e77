//! AI Integration Layer
//!
//! Provider adapters, fallback orchestration, video job coordination and
//! structured-output handling.

pub mod analysis;
pub(crate) mod http;
pub mod prompt;
pub mod provider;
pub mod schema;
pub mod text;
pub mod validation;
pub mod video;

pub use analysis::Analyzer;
pub use prompt::{PromptBuilder, PromptSection, PromptTemplates};
pub use provider::{
    AttemptOutcome, AttemptRecord, FallbackAttemptLog, ImageChain, ImageOutcome, ImagePayload,
    ImageProvider, ImageProviderRegistry, ImageResult, SharedImageProvider, create_image_providers,
    resolve_preference,
};
pub use schema::{FieldSpec, SchemaDescriptor, SchemaNode, SchemaRegistry, lookup_schema};
pub use text::{OpenAiTextProvider, SharedTextProvider, TextProvider, TextResponse, TokenUsage};
pub use validation::{extract, extract_as};
pub use video::{
    JobCoordinator, JobState, SharedVideoProvider, VideoJob, VideoModel, VideoProvider,
    VideoStatus, resolve_model,
};
