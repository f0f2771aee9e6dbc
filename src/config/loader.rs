//! Configuration loading and merging logic
//!
//! Handles loading configuration from its sources and merging them
//! according to precedence rules.

use super::{paths, schema::Config};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding `watchNamespace`
pub const WATCH_NAMESPACE_ENV: &str = "CTO_WATCH_NAMESPACE";

/// Environment variable overriding `helm.binary`
pub const HELM_BINARY_ENV: &str = "CTO_HELM_BINARY";

/// Environment variable overriding `requeueAfterSecs`
pub const REQUEUE_AFTER_ENV: &str = "CTO_REQUEUE_AFTER_SECS";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Configuration file
    /// 3. Built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let config = match paths::resolve_config_path(explicit) {
            Some(path) => Self::load_file(&path)?,
            None => Self::load_defaults(),
        };

        Self::apply_env_overrides(config)
    }

    /// Load configuration from a file
    ///
    /// Keys missing from the file take their defaults; unknown keys are rejected.
    pub fn load_file(path: &PathBuf) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse a configuration document
    pub fn parse(contents: &str) -> Result<Config> {
        // An empty file is a valid configuration of defaults
        if contents.trim().is_empty() {
            return Ok(Self::load_defaults());
        }
        let config: Config = serde_yaml::from_str(contents)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Check values serde cannot reject on its own
    pub fn validate(config: &Config) -> Result<()> {
        if config.requeue_after_secs == 0 {
            return Err(anyhow::anyhow!("requeueAfterSecs must be greater than 0"));
        }
        if config.finalizer.trim().is_empty() {
            return Err(anyhow::anyhow!("finalizer must not be empty"));
        }
        if config.helm.binary.trim().is_empty() {
            return Err(anyhow::anyhow!("helm.binary must not be empty"));
        }
        Ok(())
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        Config::default()
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Config) -> Result<Config> {
        // CTO_WATCH_NAMESPACE override; empty means all namespaces
        if let Ok(namespace) = std::env::var(WATCH_NAMESPACE_ENV) {
            config.watch_namespace = Some(namespace).filter(|ns| !ns.is_empty());
        }

        // CTO_HELM_BINARY override
        if let Ok(binary) = std::env::var(HELM_BINARY_ENV) {
            config.helm.binary = binary;
        }

        // CTO_REQUEUE_AFTER_SECS override
        if let Ok(secs) = std::env::var(REQUEUE_AFTER_ENV) {
            config.requeue_after_secs = secs
                .parse()
                .with_context(|| format!("{} must be a number of seconds", REQUEUE_AFTER_ENV))?;
        }

        Self::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.requeue_after_secs, 60);
        assert_eq!(config.helm.binary, "helm");
    }

    #[test]
    fn test_parse_empty_document() {
        let config = ConfigLoader::parse("\n").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_rejects_zero_requeue() {
        let err = ConfigLoader::parse("requeueAfterSecs: 0\n").unwrap_err();
        assert!(err.to_string().contains("requeueAfterSecs"));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "watchNamespace: clusters\nhelm:\n  timeoutSecs: 900").unwrap();

        let config = ConfigLoader::load_file(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.watch_namespace.as_deref(), Some("clusters"));
        assert_eq!(config.helm.timeout_secs, 900);
    }

    #[test]
    fn test_load_file_missing() {
        let result = ConfigLoader::load_file(&PathBuf::from("/nonexistent/config.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        // SAFETY: set_var is unsafe in Rust 2024 due to potential data races.
        // No other test reads these variables.
        unsafe {
            std::env::set_var(WATCH_NAMESPACE_ENV, "clusters");
            std::env::set_var(HELM_BINARY_ENV, "/opt/helm/bin/helm");
            std::env::set_var(REQUEUE_AFTER_ENV, "30");
        }

        let config = ConfigLoader::apply_env_overrides(Config::default()).unwrap();

        assert_eq!(config.watch_namespace.as_deref(), Some("clusters"));
        assert_eq!(config.helm.binary, "/opt/helm/bin/helm");
        assert_eq!(config.requeue_after_secs, 30);

        // SAFETY: as above
        unsafe {
            std::env::remove_var(WATCH_NAMESPACE_ENV);
            std::env::remove_var(HELM_BINARY_ENV);
            std::env::remove_var(REQUEUE_AFTER_ENV);
        }
    }
}
