use crate::types::Quality;
use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub profiles: ProfilesConfig,
    pub logging: LoggingConfig,
}

/// Receive settings for the two pre-defined subscription profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    /// Profile for remote participants not currently displayed
    pub base: ProfileSettings,
    /// Profile for the participant in the secondary display slot
    pub active_remote: ProfileSettings,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            base: ProfileSettings {
                max_quality: Quality::Low,
            },
            active_remote: ProfileSettings {
                max_quality: Quality::High,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub max_quality: Quality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // Override with environment variables (CALLVIEW_LOGGING_LEVEL, etc.)
        builder = builder.add_source(
            Environment::with_prefix("CALLVIEW")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Validate configuration, collecting every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "warning" | "error" => {}
            other => errors.push(format!("invalid logging level: {other}")),
        }
        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            other => errors.push(format!("invalid logging format: {other}")),
        }

        if self.profiles.active_remote.max_quality < self.profiles.base.max_quality {
            errors.push(
                "active_remote profile quality is below the base profile quality".to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
