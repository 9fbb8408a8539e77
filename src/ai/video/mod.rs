//! Queue-based Video Generation
//!
//! Video jobs are submitted once and then polled by the caller. The core keeps
//! no job table and runs no timers: a [`VideoJob`] is owned by the caller and
//! only [`JobCoordinator::poll`] mutates it.
//!
//! ## Modules
//!
//! - `models`: Static model table (endpoints, vocabularies, parameters)
//! - `fal_queue`: fal.ai queue adapter
//! - `coordinator`: Submit / poll orchestration

pub mod coordinator;
mod fal_queue;
pub mod models;

pub use coordinator::JobCoordinator;
pub use fal_queue::FalQueueProvider;
pub use models::{ModelAvailability, VideoModel, resolve_model};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::types::{AspectRatio, ProviderError, ProviderId};

// =============================================================================
// Job State
// =============================================================================

/// Canonical job lifecycle: `Queued → Running → {Succeeded, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Running => 1,
            Self::Succeeded | Self::Failed => 2,
        }
    }

    /// Next state given an observed one. Terminal states absorb and
    /// observations never move a job backwards.
    pub fn advance(self, observed: JobState) -> JobState {
        if self.is_terminal() || observed.rank() < self.rank() {
            self
        } else {
            observed
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// =============================================================================
// Status & Job
// =============================================================================

/// Provider status mapped onto the canonical vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStatus {
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<String>,
}

impl VideoStatus {
    pub fn queued() -> Self {
        Self::in_state(JobState::Queued)
    }

    pub fn running() -> Self {
        Self::in_state(JobState::Running)
    }

    pub fn succeeded(result_uri: impl Into<String>) -> Self {
        Self {
            state: JobState::Succeeded,
            result_uri: Some(result_uri.into()),
            failure_detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            state: JobState::Failed,
            result_uri: None,
            failure_detail: Some(detail.into()),
        }
    }

    fn in_state(state: JobState) -> Self {
        Self {
            state,
            result_uri: None,
            failure_detail: None,
        }
    }
}

/// A submitted video generation job, permanently bound to its provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoJob {
    pub job_id: String,
    pub provider_id: ProviderId,
    /// Model table key the job was submitted with
    pub model: String,
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub last_polled_at: Option<DateTime<Utc>>,
}

impl VideoJob {
    pub fn new(job_id: impl Into<String>, provider_id: ProviderId, model: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            provider_id,
            model: model.into(),
            state: JobState::Queued,
            result_uri: None,
            failure_detail: None,
            submitted_at: Utc::now(),
            last_polled_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Fold a polled status into the job. Details are only recorded on the
    /// transition into a terminal state.
    pub fn apply(&mut self, status: VideoStatus, polled_at: DateTime<Utc>) {
        self.last_polled_at = Some(polled_at);

        let was_terminal = self.state.is_terminal();
        self.state = self.state.advance(status.state);
        if was_terminal {
            return;
        }

        match self.state {
            JobState::Succeeded => self.result_uri = status.result_uri,
            JobState::Failed => self.failure_detail = status.failure_detail,
            JobState::Queued | JobState::Running => {}
        }
    }

    pub fn status(&self) -> VideoStatus {
        VideoStatus {
            state: self.state,
            result_uri: self.result_uri.clone(),
            failure_detail: self.failure_detail.clone(),
        }
    }
}

// =============================================================================
// Video Provider Trait
// =============================================================================

/// Queue-based video adapter
#[async_trait]
pub trait VideoProvider: Send + Sync {
    fn id(&self) -> &str;

    fn is_configured(&self) -> bool;

    /// Submit a job for `model`, returning the provider job id
    async fn submit(
        &self,
        model: &VideoModel,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<String, ProviderError>;

    /// One status request for a previously issued job id
    async fn status(&self, job_id: &str) -> Result<VideoStatus, ProviderError>;
}

pub type SharedVideoProvider = Arc<dyn VideoProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_is_monotonic() {
        assert_eq!(JobState::Queued.advance(JobState::Running), JobState::Running);
        assert_eq!(JobState::Queued.advance(JobState::Succeeded), JobState::Succeeded);
        assert_eq!(JobState::Running.advance(JobState::Queued), JobState::Running);
        assert_eq!(JobState::Succeeded.advance(JobState::Failed), JobState::Succeeded);
        assert_eq!(JobState::Failed.advance(JobState::Running), JobState::Failed);
    }

    #[test]
    fn test_apply_records_terminal_details_once() {
        let mut job = VideoJob::new("fal-ai/kling-video/requests/abc", ProviderId::fal(), "kling");
        let t0 = Utc::now();

        job.apply(VideoStatus::running(), t0);
        assert_eq!(job.state, JobState::Running);
        assert_eq!(job.last_polled_at, Some(t0));

        job.apply(VideoStatus::succeeded("https://cdn/v.mp4"), t0);
        assert!(job.is_terminal());
        assert_eq!(job.result_uri.as_deref(), Some("https://cdn/v.mp4"));

        let t1 = Utc::now();
        job.apply(VideoStatus::failed("late error"), t1);
        assert_eq!(job.state, JobState::Succeeded);
        assert_eq!(job.result_uri.as_deref(), Some("https://cdn/v.mp4"));
        assert_eq!(job.failure_detail, None);
        assert_eq!(job.last_polled_at, Some(t1));
    }

    #[test]
    fn test_status_serialization_omits_empty_fields() {
        let json = serde_json::to_value(VideoStatus::queued()).unwrap();
        assert_eq!(json, serde_json::json!({"state": "queued"}));
    }
}
