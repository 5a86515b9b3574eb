mod defaults;
mod types;
mod validation;

pub use defaults::*;
pub use types::*;
pub use validation::*;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

use crate::query::ResolverSettings;

/// Top-level memindex configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(find_config_file);

        let mut config = match config_path {
            Some(ref config_path) if config_path.exists() => {
                info!("Loading config from {}", config_path.display());
                load_config_file(config_path)?
            }
            Some(ref config_path) if path.is_some() => {
                bail!("Config file '{}' does not exist", config_path.display());
            }
            _ => {
                info!("No config file found, using defaults");
                Config::default()
            }
        };

        config.apply_overrides_from(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Write default configuration to a file.
    pub fn write_default(path: &str) -> Result<()> {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Apply `MEMINDEX_*` overrides read through `lookup`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("MEMINDEX_TELEGRAM_TOKEN") {
            self.telegram.bot_token = Some(token);
        }

        if let Some(port) = lookup("MEMINDEX_HTTP_PORT") {
            self.http.port = port
                .trim()
                .parse()
                .with_context(|| format!("MEMINDEX_HTTP_PORT is invalid: {port:?}"))?;
        }

        if let Some(base_url) = lookup("MEMINDEX_BASE_URL") {
            self.http.base_url = Some(base_url);
        }

        if let Some(dir) = lookup("MEMINDEX_INDEX_DIR") {
            self.index.dir = PathBuf::from(dir);
        }

        Ok(())
    }

    /// The parsed public base URL of the caption endpoint.
    pub fn base_url(&self) -> Result<Url> {
        let raw = self
            .http
            .base_url
            .as_deref()
            .context("MEMINDEX_BASE_URL is required")?;
        let url = Url::parse(raw).with_context(|| format!("Invalid URL {raw}"))?;
        if url.cannot_be_a_base() {
            bail!("Base URL {raw} cannot carry a path");
        }
        Ok(url)
    }

    /// Settings for the query resolver.
    pub fn resolver_settings(&self) -> Result<ResolverSettings> {
        Ok(ResolverSettings {
            caption_base_url: self.base_url()?,
            max_results: self.query.max_results,
            cache_time_secs: self.query.cache_time_secs,
        })
    }
}

/// Find the configuration file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from(DEFAULT_CONFIG_FILE),
        PathBuf::from("memindex.json5"),
        PathBuf::from("memindex.yaml"),
        PathBuf::from("memindex.yml"),
        PathBuf::from("memindex.toml"),
    ];

    for path in &candidates {
        if path.exists() {
            return Some(path.clone());
        }
    }

    // Check home directory
    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".memindex").join("config.json");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

/// Load configuration from a file path.
fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => {
            // Try JSON5 first, then regular JSON
            json5::from_str(&content).or_else(|_| {
                serde_json::from_str(&content).map_err(|e| json5::Error::Message {
                    msg: e.to_string(),
                    location: None,
                })
            })?
        }
    };

    Ok(config)
}
