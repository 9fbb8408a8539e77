//! Config Command
//!
//! Manage Reelsmith configuration.
//!
//! Usage:
//!   reelsmith config show [-f json|yaml]
//!   reelsmith config path
//!   reelsmith config init [-g] [--force]
//!   reelsmith config providers

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{OutputFormat, load_config};
use crate::config::ConfigLoader;
use crate::studio::Studio;
use crate::types::{ProviderId, Result};

/// Show the effective configuration (API keys are never printed)
pub fn show(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = load_config(config_path)?;
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(&config)?,
        OutputFormat::Json => ConfigLoader::render(&config, true)?,
        OutputFormat::Text => ConfigLoader::render(&config, false)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Initialize global or project configuration
pub fn init(global: bool, force: bool) -> Result<()> {
    let config_path = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(force)?
    };

    let scope = if global { "global" } else { "project" };
    Output::new().success(&format!("Initialized {} configuration", scope));
    println!("  Config: {}", config_path.display());
    Ok(())
}

/// Which image providers have credentials, in try-order
pub fn providers(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let configured = Studio::from_config(&config)?.configured_image_providers();

    let output = Output::new();
    output.section("Image providers (try-order)");
    for id in config.image.priority.iter().map(ProviderId::new) {
        let state = if configured.contains(&id) {
            "configured"
        } else {
            "missing credentials"
        };
        println!("  {:<12} {}", id, state);
    }

    if configured.is_empty() {
        output.warning("No image provider has an API key; image generation will fail");
    }
    Ok(())
}
