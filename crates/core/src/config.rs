//! Application configuration.
//!
//! Values are layered from `~/.config/trainers-log/config.toml` and then
//! environment variables prefixed with `TRAINERS_LOG_`, the latter winning.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::models::ActorId;

/// Config file location relative to the user's config directory.
pub const CONFIG_FILE: &str = "trainers-log/config.toml";

const ENV_PREFIX: &str = "TRAINERS_LOG";

const DEFAULT_CONFIG: &str = r#"# Trainer's Log configuration.
# Environment variables (TRAINERS_LOG_STORE_URL, TRAINERS_LOG_STORE_KEY,
# TRAINERS_LOG_ACTOR_ID, TRAINERS_LOG_LOG_DIR) override these values.

# Base URL of the hosted table service, e.g. https://<project>.supabase.co
# store_url = ""

# Access key sent with every request.
# store_key = ""

# Identity recorded as the author of every write.
# actor_id = "00000000-0000-0000-0000-000000000000"
"#;

/// Runtime settings for the application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Endpoint of the remote table service.
    #[serde(default)]
    pub store_url: Option<String>,
    /// Access key for the remote table service.
    #[serde(default)]
    pub store_key: Option<String>,
    /// Identity attached to every write.
    #[serde(default)]
    pub actor_id: ActorId,
    /// Directory for log files; defaults to `./logs`.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// Validated connection parameters for the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConnection {
    /// Base URL, e.g. `https://abc.supabase.co`.
    pub endpoint: String,
    /// Access key.
    pub key: String,
}

impl AppConfig {
    /// Default config file path under the user's config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILE)
    }

    /// Load from the default file and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load from `path` (optional) and the process environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_layers(path.as_ref(), Environment::with_prefix(ENV_PREFIX))
    }

    fn load_layers(path: &Path, environment: Environment) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(environment)
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Connection parameters, failing fast when either is absent or a placeholder.
    pub fn connection(&self) -> Result<StoreConnection> {
        let endpoint = self
            .store_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let key = self
            .store_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let (Some(endpoint), Some(key)) = (endpoint, key) else {
            bail!(
                "store connection is not configured; set {ENV_PREFIX}_STORE_URL and {ENV_PREFIX}_STORE_KEY or edit {}",
                Self::default_path().display()
            );
        };
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            bail!("store_url must be an http(s) URL, got {endpoint}");
        }
        if endpoint.contains("placeholder") || key.contains("placeholder") {
            bail!("store connection still uses placeholder values");
        }

        Ok(StoreConnection {
            endpoint: endpoint.to_string(),
            key: key.to_string(),
        })
    }

    /// Directory receiving log files.
    pub fn log_dir(&self) -> Result<PathBuf> {
        match &self.log_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?.join("logs")),
        }
    }
}

/// Write the commented template to the default path when no config exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = AppConfig::default_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))
}
