//! Engine configuration.
//!
//! Loaded from YAML or TOML depending on the file extension. Every field has
//! a default, so an empty file is a valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use stratus_health::{HealthCheckOptions, DEFAULT_HEALTH_INTERVAL_MS};

use crate::error::{EngineError, EngineResult};

/// How stale output resources are removed after a deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GcMode {
    /// Delete them during the deploy, before the resource is persisted.
    #[default]
    Inline,
    /// Record them on the resource and delete them in a later reconcile pass.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Pending health registrations before senders have to wait.
    pub health_channel_capacity: usize,
    pub garbage_collection: GcMode,
    /// `EnvFilter` directives used when `RUST_LOG` is not set.
    pub log_filter: String,
    pub log_format: LogFormat,
    pub health_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            health_channel_capacity: 64,
            garbage_collection: GcMode::Inline,
            log_filter: "stratus=info,warn".to_string(),
            log_format: LogFormat::Text,
            health_interval_ms: DEFAULT_HEALTH_INTERVAL_MS,
        }
    }
}

impl EngineConfig {
    /// Load a configuration file (`.yaml`, `.yml` or `.toml`).
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            _ => Err(EngineError::Config(format!(
                "Unsupported configuration file: {}",
                path.display()
            ))),
        }
    }

    pub fn from_yaml_str(content: &str) -> EngineResult<Self> {
        // An empty YAML document deserializes to unit, not a map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| EngineError::Config(format!("Invalid YAML configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| EngineError::Config(format!("Invalid TOML configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.health_channel_capacity == 0 {
            return Err(EngineError::Config(
                "health_channel_capacity must be greater than zero".to_string(),
            ));
        }
        if self.health_interval_ms == 0 {
            return Err(EngineError::Config(
                "health_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn health_check_options(&self) -> HealthCheckOptions {
        HealthCheckOptions::with_interval(Duration::from_millis(self.health_interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.garbage_collection, GcMode::Inline);
        assert_eq!(config.health_check_options().interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EngineConfig::from_yaml_str("garbage_collection: deferred\n").unwrap();
        assert_eq!(config.garbage_collection, GcMode::Deferred);
        assert_eq!(config.health_channel_capacity, 64);
        assert_eq!(EngineConfig::from_yaml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempdir().unwrap();

        let yaml = dir.path().join("engine.yaml");
        fs::write(&yaml, "health_channel_capacity: 8\nlog_format: json\n").unwrap();
        let config = EngineConfig::load(&yaml).unwrap();
        assert_eq!(config.health_channel_capacity, 8);
        assert_eq!(config.log_format, LogFormat::Json);

        let toml_path = dir.path().join("engine.toml");
        fs::write(
            &toml_path,
            "garbage_collection = \"deferred\"\nhealth_interval_ms = 500\n",
        )
        .unwrap();
        let config = EngineConfig::load(&toml_path).unwrap();
        assert_eq!(config.garbage_collection, GcMode::Deferred);
        assert_eq!(config.health_interval_ms, 500);

        let ini = dir.path().join("engine.ini");
        fs::write(&ini, "").unwrap();
        assert!(matches!(EngineConfig::load(&ini), Err(EngineError::Config(_))));

        assert!(matches!(
            EngineConfig::load(&dir.path().join("missing.yaml")),
            Err(EngineError::Io(_))
        ));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = EngineConfig::from_toml_str("health_channel_capacity = 0").unwrap_err();
        assert!(err.to_string().contains("health_channel_capacity"));
    }

    #[test]
    fn test_rejects_unknown_gc_mode() {
        assert!(EngineConfig::from_yaml_str("garbage_collection: sometimes").is_err());
    }
}
