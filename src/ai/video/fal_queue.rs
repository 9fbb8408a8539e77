//! fal.ai Queue Provider
//!
//! Submits to `queue.fal.run/{endpoint}` and polls the request's status
//! path. The job id handed to callers is the request path
//! (`<owner>/<app>/requests/<request_id>`), which is all a later poll needs.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{VideoModel, VideoProvider, VideoStatus};
use crate::ai::http;
use crate::config::ProviderSettings;
use crate::constants::fal::{API_KEY_ENV, DEFAULT_QUEUE_BASE};
use crate::types::{AspectRatio, ErrorCategory, ErrorClassifier, ProviderError, ProviderId, Result};

const REQUESTS_SEGMENT: &str = "/requests/";

pub struct FalQueueProvider {
    api_key: Option<SecretString>,
    queue_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for FalQueueProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FalQueueProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("queue_base", &self.queue_base)
            .finish()
    }
}

/// What a raw queue status asks the poller to do next
#[derive(Debug, Clone, PartialEq, Eq)]
enum QueueStep {
    Report(VideoStatus),
    FetchResult,
}

impl FalQueueProvider {
    /// `api_base` in the fal settings applies to the synchronous run endpoint,
    /// so the queue always uses its own base.
    pub fn new(settings: &ProviderSettings, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            api_key: settings.resolve_api_key(API_KEY_ENV).map(SecretString::from),
            queue_base: http::normalize_base_url(ProviderId::FAL, DEFAULT_QUEUE_BASE)?,
            client: http::build_client(timeout_secs)?,
        })
    }

    fn key(&self) -> std::result::Result<&SecretString, ProviderError> {
        self.api_key
            .as_ref()
            .ok_or_else(|| ProviderError::not_configured(ProviderId::FAL, format!("{} not set", API_KEY_ENV)))
    }

    /// `<owner>/<app>` part of an endpoint; queue paths drop any sub-path
    fn app_id(endpoint: &str) -> String {
        endpoint.split('/').take(2).collect::<Vec<_>>().join("/")
    }

    fn job_id(endpoint: &str, request_id: &str) -> String {
        format!("{}{}{}", Self::app_id(endpoint), REQUESTS_SEGMENT, request_id)
    }

    /// Job ids are interpolated into URL paths: only plain path segments pass
    fn validate_job_id(job_id: &str) -> std::result::Result<(), ProviderError> {
        let plain = |segment: &str, extra: &[char]| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || extra.contains(&c))
        };

        let well_formed = job_id
            .split_once(REQUESTS_SEGMENT)
            .is_some_and(|(app, request)| {
                let segments: Vec<&str> = app.split('/').collect();
                segments.len() == 2
                    && segments.iter().all(|s| plain(s, &['.']))
                    && plain(request, &[])
            });
        if well_formed {
            Ok(())
        } else {
            Err(ProviderError::unsupported(ProviderId::FAL, "job_id", job_id))
        }
    }

    fn map_status(status: &str) -> QueueStep {
        match status {
            "IN_QUEUE" => QueueStep::Report(VideoStatus::queued()),
            "IN_PROGRESS" => QueueStep::Report(VideoStatus::running()),
            "COMPLETED" => QueueStep::FetchResult,
            "FAILED" | "ERROR" | "CANCELLED" => {
                QueueStep::Report(VideoStatus::failed(format!("job {}", status.to_lowercase())))
            }
            other => {
                warn!("Unknown fal queue status: {}", other);
                QueueStep::Report(VideoStatus::running())
            }
        }
    }

    fn interpret_result(body: &Value) -> VideoStatus {
        if let Some(url) = body.pointer("/video/url").and_then(Value::as_str) {
            return VideoStatus::succeeded(url);
        }

        let detail = body
            .get("error")
            .or_else(|| body.get("detail"))
            .map(|e| match e {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "completed without a video".to_string());
        VideoStatus::failed(detail)
    }

    /// A rejected generation: 4xx bad-request/content-policy reply whose
    /// JSON body names the error
    fn job_failure(status: u16, body: &str) -> Option<VideoStatus> {
        let category = ErrorClassifier::classify_http_status(status, body);
        if !matches!(category, ErrorCategory::BadRequest | ErrorCategory::ContentPolicy) {
            return None;
        }

        let value: Value = serde_json::from_str(body).ok()?;
        if value.get("detail").is_some() || value.get("error").is_some() {
            Some(Self::interpret_result(&value))
        } else {
            None
        }
    }

    async fn fetch_result(&self, job_id: &str, api_key: &SecretString) -> std::result::Result<VideoStatus, ProviderError> {
        let url = format!("{}/{}", self.queue_base, job_id);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Key {}", api_key.expose_secret()))
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(ProviderId::FAL, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(ProviderId::FAL, &e))?;

        // The queue reports COMPLETED for failed generations too; the error
        // only shows up in the result body. Any other non-success reply is an
        // invocation failure and leaves the job state alone.
        if !status.is_success() {
            return match Self::job_failure(status.as_u16(), &body) {
                Some(failed) => Ok(failed),
                None => Err(ProviderError::from_status(ProviderId::FAL, status.as_u16(), &body)),
            };
        }

        let value: Value = http::decode_body(ProviderId::FAL, &body)?;
        Ok(Self::interpret_result(&value))
    }
}

#[async_trait]
impl VideoProvider for FalQueueProvider {
    fn id(&self) -> &str {
        ProviderId::FAL
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn submit(
        &self,
        model: &VideoModel,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> std::result::Result<String, ProviderError> {
        let api_key = self.key()?;

        info!("Submitting video job to fal (endpoint: {})", model.endpoint);

        let url = format!("{}/{}", self.queue_base, model.endpoint);
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Key {}", api_key.expose_secret()))
            .json(&model.build_input(prompt, aspect_ratio));

        let body: SubmitResponse = http::send_json(self.id(), request).await?;
        if body.request_id.trim().is_empty() {
            return Err(ProviderError::invocation(
                self.id(),
                ErrorCategory::ParseError,
                "queue response carried an empty request_id",
            ));
        }

        let job_id = Self::job_id(model.endpoint, &body.request_id);
        debug!(job_id = %job_id, "fal accepted video job");
        Ok(job_id)
    }

    async fn status(&self, job_id: &str) -> std::result::Result<VideoStatus, ProviderError> {
        let api_key = self.key()?;
        Self::validate_job_id(job_id)?;

        let url = format!("{}/{}/status", self.queue_base, job_id);
        let request = self
            .client
            .get(&url)
            .header("Authorization", format!("Key {}", api_key.expose_secret()));

        let body: QueueStatusResponse = http::send_json(self.id(), request).await?;
        debug!(job_id, status = %body.status, queue_position = ?body.queue_position, "fal queue status");

        match Self::map_status(&body.status) {
            QueueStep::Report(status) => Ok(status),
            QueueStep::FetchResult => self.fetch_result(job_id, api_key).await,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: String,
}

#[derive(Debug, Deserialize)]
struct QueueStatusResponse {
    status: String,
    queue_position: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::video::JobState;
    use crate::ai::video::models::resolve_model;
    use serde_json::json;

    #[test]
    fn test_job_id_uses_app_path() {
        let kling = resolve_model("kling");
        assert_eq!(
            FalQueueProvider::job_id(kling.endpoint, "764cabcf-b745"),
            "fal-ai/kling-video/requests/764cabcf-b745"
        );
    }

    #[test]
    fn test_validate_job_id() {
        assert!(FalQueueProvider::validate_job_id("fal-ai/minimax/requests/abc").is_ok());
        assert!(FalQueueProvider::validate_job_id("abc").is_err());
        assert!(FalQueueProvider::validate_job_id("fal-ai/minimax/requests/").is_err());
        assert!(FalQueueProvider::validate_job_id("../x/requests/abc/../../y").is_err());
        assert!(FalQueueProvider::validate_job_id("../x/requests/abc").is_err());
        assert!(FalQueueProvider::validate_job_id("fal-ai/luma-dream-machine/requests/764c-b745_1").is_ok());
    }

    #[test]
    fn test_validate_job_id_rejects_url_rewrites() {
        for job_id in [
            "fal-ai/x/requests/..",
            "fal-ai/x/requests/.",
            "fal-ai/x/requests/abc?logs=1",
            "fal-ai/x/requests/abc#frag",
            "fal-ai/x/requests/%2e%2e",
            "fal-ai/x y/requests/abc",
        ] {
            assert!(FalQueueProvider::validate_job_id(job_id).is_err(), "{}", job_id);
        }
    }

    #[test]
    fn test_status_vocabulary() {
        assert_eq!(
            FalQueueProvider::map_status("IN_QUEUE"),
            QueueStep::Report(VideoStatus::queued())
        );
        assert_eq!(
            FalQueueProvider::map_status("IN_PROGRESS"),
            QueueStep::Report(VideoStatus::running())
        );
        assert_eq!(FalQueueProvider::map_status("COMPLETED"), QueueStep::FetchResult);
        for failed in ["FAILED", "ERROR", "CANCELLED"] {
            match FalQueueProvider::map_status(failed) {
                QueueStep::Report(status) => assert_eq!(status.state, JobState::Failed),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(
            FalQueueProvider::map_status("WARMING_UP"),
            QueueStep::Report(VideoStatus::running())
        );
    }

    #[test]
    fn test_interpret_result() {
        let ok = FalQueueProvider::interpret_result(&json!({"video": {"url": "https://v3.fal.media/v.mp4"}}));
        assert_eq!(ok, VideoStatus::succeeded("https://v3.fal.media/v.mp4"));

        let err = FalQueueProvider::interpret_result(&json!({"error": "NSFW content detected"}));
        assert_eq!(err, VideoStatus::failed("NSFW content detected"));

        let empty = FalQueueProvider::interpret_result(&json!({"seed": 1}));
        assert_eq!(empty.state, JobState::Failed);
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let provider = FalQueueProvider {
            api_key: None,
            queue_base: DEFAULT_QUEUE_BASE.to_string(),
            client: reqwest::Client::new(),
        };

        let err = provider.status("fal-ai/kling-video/requests/abc").await.unwrap_err();
        assert!(err.is_not_configured());

        let err = provider
            .submit(resolve_model("kling"), "a wave", AspectRatio::Landscape)
            .await
            .unwrap_err();
        assert!(err.is_not_configured());
    }

    // =========================================================================
    // Queue round-trips against a local stub
    // =========================================================================

    use crate::ai::video::{JobCoordinator, VideoJob};
    use crate::types::ErrorCode;
    use chrono::Utc;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const JOB_ID: &str = "fal-ai/kling-video/requests/abc";

    /// Serves `(path suffix, status code, body)` routes, first match wins
    async fn stub_queue(routes: Vec<(&'static str, u16, &'static str)>) -> FalQueueProvider {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let mut read = 0;
                    while read < buf.len() {
                        let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        read += n;
                        if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }

                    let head = String::from_utf8_lossy(&buf[..read]).to_string();
                    let path = head.split_whitespace().nth(1).unwrap_or("").to_string();
                    let (code, body) = routes
                        .iter()
                        .find(|(suffix, _, _)| path.ends_with(suffix))
                        .map(|(_, code, body)| (*code, *body))
                        .unwrap_or((404, "{}"));

                    let response = format!(
                        "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        code,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        FalQueueProvider {
            api_key: Some(SecretString::from("test-key")),
            queue_base: format!("http://{}", addr),
            client: reqwest::Client::new(),
        }
    }

    fn running_job() -> VideoJob {
        let mut job = VideoJob::new(JOB_ID, ProviderId::fal(), "kling");
        job.apply(VideoStatus::running(), Utc::now());
        job
    }

    #[tokio::test]
    async fn test_completed_job_fetches_video_url() {
        let provider = stub_queue(vec![
            ("/status", 200, r#"{"status": "COMPLETED"}"#),
            ("/requests/abc", 200, r#"{"video": {"url": "https://v3.fal.media/out.mp4"}}"#),
        ])
        .await;

        let status = provider.status(JOB_ID).await.unwrap();
        assert_eq!(status, VideoStatus::succeeded("https://v3.fal.media/out.mp4"));
    }

    #[tokio::test]
    async fn test_result_fetch_server_error_keeps_job_running() {
        for (code, body) in [(503, "upstream busy"), (429, "slow down"), (401, "bad key")] {
            let routes = vec![
                ("/status", 200, r#"{"status": "COMPLETED"}"#),
                ("/requests/abc", code, body),
            ];
            let provider = stub_queue(routes).await;

            let err = provider.status(JOB_ID).await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvocationFailed, "HTTP {}", code);

            let coordinator = JobCoordinator::new("kling").register(Arc::new(provider));
            let mut job = running_job();
            let err = coordinator.poll(&mut job).await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvocationFailed);
            assert_eq!(job.state, JobState::Running);
            assert!(job.failure_detail.is_none());
            assert!(job.last_polled_at.is_some());

            // A later successful poll still lands
            job.apply(VideoStatus::succeeded("https://v3.fal.media/out.mp4"), Utc::now());
            assert_eq!(job.state, JobState::Succeeded);
        }
    }

    #[tokio::test]
    async fn test_rejected_generation_is_terminal_failure() {
        let provider = stub_queue(vec![
            ("/status", 200, r#"{"status": "COMPLETED"}"#),
            ("/requests/abc", 422, r#"{"detail": "duration must be 5 or 10"}"#),
        ])
        .await;
        let coordinator = JobCoordinator::new("kling").register(Arc::new(provider));

        let mut job = running_job();
        assert_eq!(coordinator.poll(&mut job).await.unwrap(), JobState::Failed);
        assert_eq!(job.failure_detail.as_deref(), Some("duration must be 5 or 10"));
        assert!(job.is_terminal());
    }

    #[tokio::test]
    async fn test_bad_request_without_error_body_is_invocation_failure() {
        let provider = stub_queue(vec![
            ("/status", 200, r#"{"status": "COMPLETED"}"#),
            ("/requests/abc", 400, "<html>bad gateway config</html>"),
        ])
        .await;

        let err = provider.status(JOB_ID).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvocationFailed);
    }

    #[tokio::test]
    async fn test_in_progress_does_not_fetch_result() {
        let provider = stub_queue(vec![
            ("/status", 200, r#"{"status": "IN_PROGRESS", "queue_position": 0}"#),
            ("/requests/abc", 500, "should not be called"),
        ])
        .await;

        assert_eq!(provider.status(JOB_ID).await.unwrap(), VideoStatus::running());
    }
}
