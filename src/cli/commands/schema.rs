//! Schema Command
//!
//! Usage:
//!   reelsmith schema                    # list analysis kinds
//!   reelsmith schema video_script       # JSON Schema for one kind
//!   reelsmith schema seo_metadata -f yaml

use serde_json::{Value, json};

use crate::ai::schema::{SchemaRegistry, lookup_schema};
use crate::cli::ui::Output;
use crate::cli::util::{OutputFormat, print_document, render};
use crate::types::Result;

pub fn run(kind: Option<&str>, format: OutputFormat) -> Result<()> {
    match kind {
        Some(kind) => {
            let descriptor = lookup_schema(kind)?;
            print_document(&descriptor.to_json_schema(), format)
        }
        None => list(format),
    }
}

fn list(format: OutputFormat) -> Result<()> {
    let descriptors = SchemaRegistry::global().descriptors();

    let rows: Vec<Value> = descriptors
        .iter()
        .map(|d| {
            json!({
                "kind": d.analysis_kind,
                "description": d.description,
                "required": d.required_fields(),
            })
        })
        .collect();
    if let Some(rendered) = render(&rows, format)? {
        println!("{}", rendered.trim_end());
        return Ok(());
    }

    let output = Output::new();
    output.section("Analysis kinds");
    for descriptor in descriptors {
        println!("  {:<20} {}", descriptor.analysis_kind, descriptor.description);
        println!("  {:<20} required: {}", "", descriptor.required_fields().join(", "));
    }
    Ok(())
}
