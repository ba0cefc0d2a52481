use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Storage root cannot be empty")]
    EmptyStorageRoot,

    #[error("Invalid validation_attempts: {0}. Must be at least 1")]
    InvalidValidationAttempts(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Unknown default backend: {0}")]
    UnknownDefaultBackend(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .foreman/config.yaml (project config)
    /// 3. .foreman/local.yaml (project local overrides, optional)
    /// 4. Environment variables (FOREMAN_* prefix, highest priority)
    ///
    /// Configuration is always project-local (pwd/.foreman/) so several
    /// process corpora can coexist on one machine.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".foreman/config.yaml"))
            .merge(Yaml::file(".foreman/local.yaml"))
            .merge(Env::prefixed("FOREMAN_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.storage.root.is_empty() {
            return Err(ConfigError::EmptyStorageRoot);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.retry.validation_attempts == 0 {
            return Err(ConfigError::InvalidValidationAttempts(
                config.retry.validation_attempts,
            ));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        let known_backends = ["command", "http", "mock"];
        if !known_backends.contains(&config.backends.default_backend.as_str()) {
            return Err(ConfigError::UnknownDefaultBackend(
                config.backends.default_backend.clone(),
            ));
        }
        for (agent, backend) in &config.backends.agent_mappings {
            if !known_backends.contains(&backend.as_str()) {
                return Err(ConfigError::ValidationFailed(format!(
                    "agent '{agent}' is mapped to unknown backend '{backend}'"
                )));
            }
        }

        if config.backends.command.program.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "command backend program cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.storage.root, ".foreman/runs");
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        let result = ConfigLoader::validate(&config);
        match result.unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_empty_storage_root() {
        let mut config = Config::default();
        config.storage.root = String::new();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyStorageRoot
        ));
    }

    #[test]
    fn test_validate_zero_validation_attempts() {
        let mut config = Config::default();
        config.retry.validation_attempts = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidValidationAttempts(0)
        ));
    }

    #[test]
    fn test_validate_invalid_backoff() {
        let mut config = Config::default();
        config.retry.initial_backoff_ms = 30_000;
        config.retry.max_backoff_ms = 10_000;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidBackoff(30_000, 10_000)
        ));
    }

    #[test]
    fn test_validate_unknown_backend_mapping() {
        let mut config = Config::default();
        config
            .backends
            .agent_mappings
            .insert("someone".to_string(), "quantum".to_string());

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::ValidationFailed(_)
        ));
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "retry:\n  validation_attempts: 4\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "logging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.retry.validation_attempts, 4, "Base value persists");
        assert_eq!(config.logging.level, "debug", "Override wins");
        assert_eq!(
            config.logging.format, "json",
            "Base value persists when not overridden"
        );
    }
}
