//! Runtime configuration
//!
//! Defaults, optionally overlaid by a JSON file (`FOODPRINT_CONFIG`) and then
//! by environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Vision API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub model_name: String,
    /// Never serialized back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub image_max_width: u32,
    pub image_max_height: u32,
    /// Recognitions below this are logged as low confidence
    pub confidence_threshold: f64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model_name: "gemini-2.0-flash".to_string(),
            api_key: None,
            max_retries: 3,
            retry_delay_ms: 1000,
            request_timeout_secs: 30,
            image_max_width: 800,
            image_max_height: 600,
            confidence_threshold: 0.7,
        }
    }
}

/// Scale and display link settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub serial_port: Option<String>,
    pub baudrate: u32,
    /// Readings below this are ignored
    pub min_weight_grams: f64,
    /// Stable readings above this start an analysis
    pub auto_trigger_grams: f64,
    pub max_capacity_grams: f64,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            serial_port: None,
            baudrate: 115_200,
            min_weight_grams: 5.0,
            auto_trigger_grams: 50.0,
            max_capacity_grams: 5000.0,
        }
    }
}

/// Persistence settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Defaults to `data/foodprint.db` under the project root
    pub database_path: Option<PathBuf>,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ai: AiConfig,
    pub hardware: HardwareConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load from `FOODPRINT_CONFIG` (if set) and apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("FOODPRINT_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON config file. A missing file yields the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        tracing::info!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_env<F>(&mut self, get: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")) {
            self.ai.api_key = Some(key);
        }
        if let Some(model) = get("FOODPRINT_AI_MODEL") {
            self.ai.model_name = model;
        }
        if let Some(port) = get("FOODPRINT_SERIAL_PORT") {
            self.hardware.serial_port = Some(port);
        }
        if let Some(baud) = get("FOODPRINT_BAUDRATE") {
            self.hardware.baudrate = baud.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "FOODPRINT_BAUDRATE".to_string(),
                value: baud.clone(),
            })?;
        }
        if let Some(path) = get("FOODPRINT_DATABASE_PATH") {
            self.storage.database_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.ai.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Database path from config, or `data/foodprint.db` under the project root
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// `data/foodprint.db` beside the executable, stepping out of target/{debug,release}
pub fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(parent) = path.parent() {
            if let Some(grandparent) = parent.parent() {
                path = grandparent.to_path_buf();
            }
        }
    }

    path.push("data");
    path.push("foodprint.db");
    path
}
