//! Video Job Coordinator
//!
//! Validates a submission against the model table, sends it to exactly one
//! provider, and folds caller-driven polls into the job. No fallback between
//! providers, no background polling, no caching of statuses.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use super::models::{ModelAvailability, resolve_model};
use super::{FalQueueProvider, JobState, SharedVideoProvider, VideoJob, VideoStatus};
use crate::config::Config;
use crate::types::{GenError, GenerationRequest, MediaKind, ProviderError, ProviderId, Result};

pub struct JobCoordinator {
    providers: Vec<SharedVideoProvider>,
    default_model: String,
}

impl std::fmt::Debug for JobCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.providers.iter().map(|p| p.id()).collect();
        f.debug_struct("JobCoordinator")
            .field("providers", &ids)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl JobCoordinator {
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            providers: Vec::new(),
            default_model: default_model.into(),
        }
    }

    /// Coordinator with the built-in queue adapters
    pub fn from_config(config: &Config) -> Result<Self> {
        let fal = FalQueueProvider::new(&config.providers.fal, config.video.timeout_secs)?;
        Ok(Self::new(config.video.default_model.clone()).register(Arc::new(fal)))
    }

    /// Add an adapter, replacing any previously registered one with the same id
    pub fn register(mut self, provider: SharedVideoProvider) -> Self {
        self.providers.retain(|p| p.id() != provider.id());
        self.providers.push(provider);
        self
    }

    fn provider(&self, id: &str) -> std::result::Result<&SharedVideoProvider, ProviderError> {
        self.providers
            .iter()
            .find(|p| p.id() == id)
            .ok_or_else(|| ProviderError::not_configured(id, "no video adapter registered"))
    }

    /// Submit a video job. `model` defaults to the configured default model.
    #[instrument(skip(self, request), fields(aspect = %request.aspect_ratio()))]
    pub async fn submit(&self, request: &GenerationRequest, model: Option<&str>) -> Result<VideoJob> {
        let requested = model.unwrap_or(self.default_model.as_str());
        let model = resolve_model(requested);

        if let ModelAvailability::NotYetAvailable(reason) = &model.availability {
            return Err(GenError::ProviderUnavailable {
                model: model.key.to_string(),
                reason: reason.to_string(),
            });
        }

        if request.kind() != MediaKind::Video {
            return Err(GenError::unsupported("kind", request.kind().to_string()));
        }

        let aspect_ratio = request.aspect_ratio();
        if !model.supports(aspect_ratio) {
            return Err(ProviderError::unsupported(
                model.provider_id,
                "aspect_ratio",
                format!("{} (model {})", aspect_ratio, model.key),
            )
            .into());
        }

        let provider = self.provider(model.provider_id)?;
        if !provider.is_configured() {
            return Err(ProviderError::not_configured(model.provider_id, "credential missing").into());
        }

        if model.key != requested.trim().to_lowercase() {
            info!(requested, resolved = model.key, "Resolved video model");
        }

        let job_id = provider
            .submit(model, request.prompt(), aspect_ratio)
            .await
            .inspect_err(|e| warn!(model = model.key, error = %e, "Video submission failed"))?;

        info!(job_id = %job_id, provider = model.provider_id, model = model.key, "Video job submitted");
        Ok(VideoJob::new(job_id, model.provider(), model.key))
    }

    /// One status request to the job's own provider, folded into the job
    #[instrument(skip(self, job), fields(job_id = %job.job_id, provider = %job.provider_id))]
    pub async fn poll(&self, job: &mut VideoJob) -> Result<JobState> {
        let status = self.poll_by_id(&job.provider_id, &job.job_id).await;
        let polled_at = Utc::now();

        match status {
            Ok(status) => {
                let previous = job.state;
                job.apply(status, polled_at);
                if job.state != previous {
                    info!(from = %previous, to = %job.state, "Video job state changed");
                }
                Ok(job.state)
            }
            Err(err) => {
                job.last_polled_at = Some(polled_at);
                Err(err)
            }
        }
    }

    /// Status of a job known only by its identifiers
    pub async fn poll_by_id(&self, provider_id: &ProviderId, job_id: &str) -> Result<VideoStatus> {
        if job_id.trim().is_empty() {
            return Err(GenError::unsupported("job_id", "<empty>"));
        }
        let provider = self.provider(provider_id.as_str())?;
        Ok(provider.status(job_id).await?)
    }
}
