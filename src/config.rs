//! Configuration resolution for verdant-ai
//!
//! Two-tier resolution with ENV → TOML priority. The resolved [`AiConfig`]
//! is handed to the pipelines at construction time; nothing below the API
//! layer reads the process environment.
//!
//! TOML file location: `$VERDANT_CONFIG` when set, otherwise
//! `~/.config/verdant/verdant-ai.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5601";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration error
#[derive(Debug, Error)]
#[error("Configuration error: {0}")]
pub struct ConfigError(pub String);

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Listen address for the HTTP server
    pub bind_address: String,
    /// Primary ML backend base URL; absence means every scan starts at the
    /// generative-AI fallback
    pub primary_backend_url: Option<String>,
    /// Generative Language API key (required)
    pub gemini_api_key: String,
    /// Upper bound for each outbound HTTP call
    pub request_timeout_secs: u64,
}

/// On-disk TOML shape (all keys optional)
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub bind_address: Option<String>,
    pub primary_backend_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Resolve configuration with ENV → TOML priority.
pub fn resolve_config() -> Result<AiConfig, ConfigError> {
    let toml_config = load_toml_config().unwrap_or_default();

    let gemini_api_key = resolve_gemini_api_key(&toml_config)?;

    let primary_backend_url = std::env::var("VERDANT_ML_BACKEND_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| toml_config.primary_backend_url.clone());

    if primary_backend_url.is_none() {
        info!("No primary ML backend configured; scans will use generative classification only");
    }

    let bind_address = std::env::var("VERDANT_BIND")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| toml_config.bind_address.clone())
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

    let request_timeout_secs = toml_config
        .request_timeout_secs
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

    Ok(AiConfig {
        bind_address,
        primary_backend_url,
        gemini_api_key,
        request_timeout_secs,
    })
}

/// Resolve the Generative Language API key from ENV → TOML.
fn resolve_gemini_api_key(toml_config: &TomlConfig) -> Result<String, ConfigError> {
    let env_key = std::env::var("VERDANT_GEMINI_API_KEY")
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .gemini_api_key
        .clone()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Gemini API key found in both environment and TOML config. \
             Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("Gemini API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        info!("Gemini API key loaded from TOML config");
        return Ok(key);
    }

    Err(ConfigError(
        "Gemini API key not configured. Please configure using one of:\n\
         1. Environment: VERDANT_GEMINI_API_KEY=your-key-here\n\
         2. TOML config: ~/.config/verdant/verdant-ai.toml (gemini_api_key = \"your-key\")\n\
         \n\
         Obtain API key at: https://aistudio.google.com/apikey"
            .to_string(),
    ))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Load the TOML tier, if a config file exists and parses.
fn load_toml_config() -> Option<TomlConfig> {
    let path = config_file_path()?;
    if !path.exists() {
        return None;
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                warn!("Ignoring unparseable config {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            warn!("Ignoring unreadable config {}: {}", path.display(), e);
            None
        }
    }
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("VERDANT_CONFIG") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join("verdant").join("verdant-ai.toml"))
}
