//! CLI Common Utilities
//!
//! Shared config loading, input reading and structured output for commands.

use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::config::{Config, ConfigLoader};
use crate::studio::Studio;
use crate::types::Result;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    /// clap value parser
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(format!(
                "Invalid format '{}'. Valid values: text, json, yaml",
                s
            )),
        }
    }
}

/// Explicit config file, or the full resolution chain
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

pub fn load_studio(path: Option<&Path>) -> Result<Studio> {
    Studio::from_config(&load_config(path)?)
}

/// Read a file, or stdin when no path (or `-`) is given
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Serialize for machine-readable formats; `None` means the caller renders text
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<Option<String>> {
    match format {
        OutputFormat::Text => Ok(None),
        OutputFormat::Json => Ok(Some(serde_json::to_string_pretty(value)?)),
        OutputFormat::Yaml => Ok(Some(serde_yaml::to_string(value)?)),
    }
}

/// Print `value` as JSON unless YAML was asked for
pub fn print_document<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        _ => serde_json::to_string_pretty(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
