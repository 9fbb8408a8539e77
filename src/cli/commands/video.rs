//! Video Commands
//!
//! Usage:
//!   reelsmith video submit "waves on basalt" [--model kling] [--aspect 16:9] [--wait [--timeout 600]]
//!   reelsmith video poll fal fal-ai/kling-video/requests/<id>
//!   reelsmith video models

use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::ai::video::models::{ModelAvailability, models};
use crate::ai::video::{VideoJob, VideoStatus};
use crate::cli::ui::Output;
use crate::cli::util::{OutputFormat, render};
use crate::studio::Studio;
use crate::types::{GenError, ProviderError, Result};

/// Options for `video submit`
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub prompt: String,
    pub aspect_ratio: String,
    pub model: Option<String>,
    /// Keep polling until the job is terminal
    pub wait: bool,
    pub interval_secs: u64,
    /// Give up waiting after this many seconds; the job keeps running upstream
    pub timeout_secs: Option<u64>,
    pub format: OutputFormat,
}

pub async fn submit(studio: &Studio, options: SubmitOptions) -> Result<()> {
    let mut job = studio
        .submit_video(&options.prompt, &options.aspect_ratio, options.model.as_deref())
        .await?;

    if options.wait {
        let interval = Duration::from_secs(options.interval_secs.max(1));
        let timeout = options.timeout_secs.map(Duration::from_secs);
        if !wait_for_terminal(studio, &mut job, interval, timeout).await? {
            Output::new().warning("Stopped waiting before the job finished");
        }
    }

    if let Some(rendered) = render(&job, options.format)? {
        println!("{}", rendered.trim_end());
        return Ok(());
    }

    print_job(&job);
    Ok(())
}

/// Poll until the job is terminal. Retryable invocation failures are logged
/// and polled through. Returns `false` when `timeout` elapses first.
pub async fn wait_for_terminal(
    studio: &Studio,
    job: &mut VideoJob,
    interval: Duration,
    timeout: Option<Duration>,
) -> Result<bool> {
    let started = Instant::now();

    while !job.is_terminal() {
        if timeout.is_some_and(|limit| started.elapsed() >= limit) {
            return Ok(false);
        }
        tokio::time::sleep(interval).await;

        match studio.refresh_video(job).await {
            Ok(status) => {
                debug!(job_id = %job.job_id, state = %status.state, "Polled video job");
            }
            Err(GenError::Provider(ProviderError::InvocationFailed { category, message, .. }))
                if category.is_retryable() =>
            {
                warn!(job_id = %job.job_id, %category, message = %message, "Poll failed, retrying");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(true)
}

pub async fn poll(studio: &Studio, provider_id: &str, job_id: &str, format: OutputFormat) -> Result<()> {
    let status = studio.poll_video(provider_id, job_id).await?;

    if let Some(rendered) = render(&status, format)? {
        println!("{}", rendered.trim_end());
        return Ok(());
    }

    print_status(&Output::new(), &status);
    Ok(())
}

/// List the model table
pub fn list_models(format: OutputFormat) -> Result<()> {
    if format != OutputFormat::Text {
        let rows: Vec<Value> = models()
            .iter()
            .map(|m| {
                json!({
                    "key": m.key,
                    "aliases": m.aliases,
                    "provider": m.provider_id,
                    "endpoint": m.endpoint,
                    "aspect_ratios": m.aspect_ratios,
                    "available": m.is_available(),
                })
            })
            .collect();
        if let Some(rendered) = render(&rows, format)? {
            println!("{}", rendered.trim_end());
        }
        return Ok(());
    }

    let output = Output::new();
    output.section("Video models");
    for model in models() {
        let aspects: Vec<&str> = model.aspect_ratios.iter().map(|a| a.as_ratio()).collect();
        let note = match &model.availability {
            ModelAvailability::Available => aspects.join(", "),
            ModelAvailability::NotYetAvailable(reason) => format!("unavailable: {}", reason),
        };
        println!("  {:<12} {:<10} {}", model.key, model.provider_id, note);
    }
    Ok(())
}

fn print_job(job: &VideoJob) {
    let output = Output::new();
    output.success(&format!("Video job {} ({})", job.state, job.model));
    output.field("Provider", job.provider_id.as_str());
    output.field("Job", &job.job_id);
    print_status(&output, &job.status());

    if !job.is_terminal() {
        output.info(&format!(
            "Poll with: reelsmith video poll {} {}",
            job.provider_id, job.job_id
        ));
    }
}

fn print_status(output: &Output, status: &VideoStatus) {
    output.field("State", &status.state.to_string());
    if let Some(uri) = &status.result_uri {
        output.field("Video", uri);
    }
    if let Some(detail) = &status.failure_detail {
        output.warning(detail);
    }
}
