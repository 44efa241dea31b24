//! Application configuration for the demo.
//!
//! Layers, lowest first: built-in defaults, an optional JSON file, then
//! `TINTA_*` environment variables. Command-line flags are applied by `main`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tinta_host::InvokerConfig;
use tinta_module::ModuleConfig;

/// How long to wait for the compute module to load by default.
const DEFAULT_READY_TIMEOUT_MS: u64 = 5_000;

/// Environment override for `invoker.ready_timeout_ms`.
const ENV_READY_TIMEOUT_MS: &str = "TINTA_READY_TIMEOUT_MS";
/// Environment override for `module.max_pages`.
const ENV_MAX_PAGES: &str = "TINTA_MAX_PAGES";

/// Runtime configuration for the Tinta demo application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub invoker: InvokerConfig,
    pub module: ModuleConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            invoker: InvokerConfig {
                ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
                ..Default::default()
            },
            module: ModuleConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, overlaid with `path` if given, overlaid with the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply `TINTA_*` overrides looked up through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_READY_TIMEOUT_MS) {
            self.invoker.ready_timeout_ms = parse_env(ENV_READY_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_PAGES) {
            self.module.max_pages = parse_env(ENV_MAX_PAGES, &value)?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        key,
        value: value.to_string(),
    })
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value {value:?} for {key}")]
    Env { key: &'static str, value: String },
}
