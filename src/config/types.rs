use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;
use crate::media::MediaKind;

// ============================================================================
// Telegram Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u32,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }
}

fn default_poll_timeout() -> u32 {
    DEFAULT_POLL_TIMEOUT_SECS
}

// ============================================================================
// HTTP Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_http_bind")]
    pub bind: String,
    /// Public URL the caption endpoint is reachable at. Its path is where the
    /// caption route is mounted.
    pub base_url: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_HTTP_PORT,
            bind: DEFAULT_HTTP_BIND.to_string(),
            base_url: None,
        }
    }
}

fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}

fn default_http_bind() -> String {
    DEFAULT_HTTP_BIND.to_string()
}

// ============================================================================
// Index Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexConfig {
    #[serde(default = "default_index_dir")]
    pub dir: PathBuf,
    pub sticker_file: Option<String>,
    pub photo_file: Option<String>,
    pub animated_file: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
            sticker_file: None,
            photo_file: None,
            animated_file: None,
        }
    }
}

impl IndexConfig {
    /// Path of the index file of `kind`.
    pub fn path_for(&self, kind: MediaKind) -> PathBuf {
        let name = match kind {
            MediaKind::Sticker => self.sticker_file.as_deref(),
            MediaKind::Photo => self.photo_file.as_deref(),
            MediaKind::Animated => self.animated_file.as_deref(),
        };
        self.dir.join(name.unwrap_or_else(|| kind.default_file_name()))
    }

    /// `(kind, path)` for every media kind.
    pub fn files(&self) -> Vec<(MediaKind, PathBuf)> {
        MediaKind::ALL
            .into_iter()
            .map(|kind| (kind, self.path_for(kind)))
            .collect()
    }
}

fn default_index_dir() -> PathBuf {
    PathBuf::from(DEFAULT_INDEX_DIR)
}

// ============================================================================
// Query Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConfig {
    #[serde(default = "default_cache_time")]
    pub cache_time_secs: u32,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            cache_time_secs: DEFAULT_CACHE_TIME_SECS,
            max_results: MAX_INLINE_RESULTS,
        }
    }
}

fn default_cache_time() -> u32 {
    DEFAULT_CACHE_TIME_SECS
}

fn default_max_results() -> usize {
    MAX_INLINE_RESULTS
}

// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LoggingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LoggingLevel,
    #[serde(default)]
    pub json: bool,
}
