//! Image Command
//!
//! Generate one image through the provider fallback chain.
//!
//! Usage:
//!   reelsmith image "a lighthouse at dusk" [--aspect 16:9] [--provider fal] [-f json]

use crate::ai::provider::{ImageOutcome, ImagePayload};
use crate::cli::ui::Output;
use crate::cli::util::{OutputFormat, render};
use crate::studio::Studio;
use crate::types::Result;

pub async fn run(
    studio: &Studio,
    prompt: &str,
    aspect_ratio: &str,
    provider: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let outcome = studio.generate_image(prompt, aspect_ratio, provider).await?;

    if let Some(rendered) = render(&outcome, format)? {
        println!("{}", rendered.trim_end());
        return Ok(());
    }

    print_text(&outcome);
    Ok(())
}

fn print_text(outcome: &ImageOutcome) {
    let output = Output::new();
    output.success(&format!("Generated with {}", outcome.provider_id()));

    match &outcome.result.payload {
        ImagePayload::Uri { uri } => output.field("Image", uri),
        ImagePayload::Inline { mime_type, base64 } => {
            output.field("Image", &format!("inline {} ({} base64 chars)", mime_type, base64.len()));
            output.info("Use --format json to get the full data URI");
        }
    }

    if let Some(revised) = outcome.result.metadata.get("revised_prompt").and_then(|v| v.as_str()) {
        output.field("Prompt", revised);
    }

    output.attempts(&outcome.attempts);
}
