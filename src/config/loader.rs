//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/reelsmith/config.toml)
//! 3. Project config (.reelsmith/config.toml)
//! 4. Environment variables (REELSMITH_* prefix, `__` separates sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{GenError, Result};

const ENV_PREFIX: &str = "REELSMITH_";
const DIR_NAME: &str = "reelsmith";
const PROJECT_DIR: &str = ".reelsmith";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific file layered over defaults and env vars
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(GenError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Config> {
        // REELSMITH_PROVIDERS__FAL__API_KEY -> providers.fal.api_key
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true))
            .extract()
            .map_err(|e| GenError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/reelsmith/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join(DIR_NAME))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(PROJECT_DIR).join("config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render the effective configuration (API keys are never serialized)
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| GenError::Config(e.to_string()))
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write a default config file into `dir`, returning its path
    pub fn init_in(dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            GenError::Config("Cannot determine global config directory".to_string())
        })?;
        Self::init_in(&global_dir, force)
    }

    /// Initialize project configuration
    pub fn init_project(force: bool) -> Result<PathBuf> {
        Self::init_in(Path::new(PROJECT_DIR), force)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn default_config() -> String {
        r#"# Reelsmith Configuration
# Project settings in .reelsmith/config.toml override the global file.
# API keys may also come from OPENAI_API_KEY, STABILITY_API_KEY and FAL_KEY.

version = "1.0"

[image]
priority = ["openai", "stability", "fal"]
timeout_secs = 120

[video]
default_model = "kling"
timeout_secs = 30

[text]
model = "gpt-4o-mini"
temperature = 0.2
max_tokens = 2048

# [providers.openai]
# api_key = "sk-..."
# api_base = "https://api.openai.com/v1"
# model = "dall-e-3"

# [providers.stability]
# api_key = "sk-..."

# [providers.fal]
# api_key = "..."
# model = "fal-ai/flux/schnell"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_file_parses() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigLoader::init_in(temp_dir.path(), false).unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.image.priority, vec!["openai", "stability", "fal"]);
        assert_eq!(config.video.default_model, "kling");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[image]
priority = ["fal", "openai"]

[providers.fal]
model = "fal-ai/flux/dev"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.image.priority, vec!["fal", "openai"]);
        assert_eq!(config.providers.fal.model.as_deref(), Some("fal-ai/flux/dev"));
        assert_eq!(config.image.timeout_secs, 120);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[text]\ntemperature = 9.0\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(matches!(err, GenError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_init_does_not_overwrite_without_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "version = \"2.0\"\n").unwrap();

        ConfigLoader::init_in(temp_dir.path(), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "version = \"2.0\"\n");

        ConfigLoader::init_in(temp_dir.path(), true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[image]"));
    }

    #[test]
    fn test_render_never_includes_api_key() {
        let mut config = Config::default();
        config.providers.openai.api_key = Some("sk-live-secret".to_string());

        let toml = ConfigLoader::render(&config, false).unwrap();
        let json = ConfigLoader::render(&config, true).unwrap();
        assert!(!toml.contains("sk-live-secret"));
        assert!(!json.contains("sk-live-secret"));
    }
}
