use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    #[serde(default)]
    pub run_migrations: bool,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub expiry: ExpiryConfig,
}

/// Stand-in test figures fed into the health score.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthConfig {
    #[serde(default = "default_tests_total")]
    pub assumed_tests_total: u32,
    #[serde(default = "default_tests_passed")]
    pub assumed_tests_passed: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        HealthConfig {
            assumed_tests_total: default_tests_total(),
            assumed_tests_passed: default_tests_passed(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExpiryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        ExpiryConfig {
            enabled: false,
            sweep_interval_secs: default_sweep_interval(),
            webhook_url: None,
        }
    }
}

fn default_tests_total() -> u32 {
    10
}

fn default_tests_passed() -> u32 {
    8
}

fn default_sweep_interval() -> u64 {
    24 * 60 * 60
}

impl Config {
    /// Loads the TOML file at `path`; `DEVCOLLAB__*` environment variables
    /// override individual keys (e.g. `DEVCOLLAB__EXPIRY__ENABLED=true`).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        let builder = config::Config::builder()
            .add_source(config::File::from(config_path).required(true))
            .add_source(config::Environment::with_prefix("DEVCOLLAB").separator("__"));

        let settings = builder
            .build()
            .with_context(|| format!("Failed to build configuration from path: {:?}", config_path))?;

        settings
            .try_deserialize()
            .with_context(|| format!("Failed to deserialize configuration from path: {:?}", config_path))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .context("Failed to build configuration from string")?
            .try_deserialize()
            .context("Failed to deserialize configuration from string")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_uses_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            database_url = "postgres://localhost/devcollab"
            listen_addr = "127.0.0.1:3000"
            "#,
        )
        .unwrap();
        assert!(!cfg.run_migrations);
        assert_eq!(cfg.health, HealthConfig::default());
        assert_eq!(cfg.health.assumed_tests_total, 10);
        assert_eq!(cfg.expiry.sweep_interval_secs, 86_400);
        assert!(!cfg.expiry.enabled);
        assert_eq!(cfg.expiry.webhook_url, None);
    }

    #[test]
    fn sections_override_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            database_url = "postgres://localhost/devcollab"
            listen_addr = "0.0.0.0:8080"
            run_migrations = true

            [health]
            assumed_tests_total = 40

            [expiry]
            enabled = true
            sweep_interval_secs = 60
            webhook_url = "http://mailer.internal/notify"
            "#,
        )
        .unwrap();
        assert!(cfg.run_migrations);
        assert_eq!(cfg.health.assumed_tests_total, 40);
        assert_eq!(cfg.health.assumed_tests_passed, 8);
        assert_eq!(cfg.expiry.sweep_interval_secs, 60);
        assert_eq!(cfg.expiry.webhook_url.as_deref(), Some("http://mailer.internal/notify"));
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(Config::from_toml_str(r#"listen_addr = "0.0.0.0:8080""#).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Config::load("config/does-not-exist.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("does-not-exist"));
    }
}
