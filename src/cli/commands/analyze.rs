//! Analyze Command
//!
//! Run a structured analysis of text content through the configured text model.
//!
//! Usage:
//!   reelsmith analyze seo_metadata transcript.txt
//!   cat notes.md | reelsmith takeaways

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{OutputFormat, print_document, read_input, render};
use crate::studio::Studio;
use crate::types::Result;

pub async fn run(studio: &Studio, kind: &str, input: Option<&Path>, format: OutputFormat) -> Result<()> {
    // Unknown kinds fail before stdin is read
    studio.lookup_schema(kind)?;

    let content = read_input(input)?;
    let value = studio.analyze(kind, &content).await?;
    print_document(&value, format)
}

pub async fn takeaways(studio: &Studio, input: Option<&Path>, format: OutputFormat) -> Result<()> {
    let content = read_input(input)?;
    let takeaways = studio.key_takeaways(&content).await?;

    if let Some(rendered) = render(&takeaways, format)? {
        println!("{}", rendered.trim_end());
        return Ok(());
    }

    let output = Output::new();
    if takeaways.is_empty() {
        output.warning("No takeaways extracted");
        return Ok(());
    }
    output.section("Key takeaways");
    for (i, takeaway) in takeaways.iter().enumerate() {
        println!("  {}. {}", i + 1, takeaway);
    }
    Ok(())
}
