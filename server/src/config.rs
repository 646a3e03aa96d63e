//! Server configuration.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thumbnail::ThumbnailConfig;

/// Environment variable prefix. Nested keys use `__`, e.g.
/// `GEOPHOTO_SERVER__BIND=0.0.0.0:3000`.
pub const ENV_PREFIX: &str = "GEOPHOTO_";

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub thumbnail: ThumbnailConfig,
}

impl AppConfig {
    /// Load configuration from an optional TOML file, overridden by
    /// `GEOPHOTO_`-prefixed environment variables. Every field has a default,
    /// so neither source is required.
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut figment = Figment::new();

        if config_path.exists() {
            tracing::info!(config_path = %config_path.display(), "Loading configuration from file");
            figment = figment.merge(Toml::file(config_path));
        } else {
            tracing::debug!("No config file found at {}", config_path.display());
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to load configuration")
    }
}

/// HTTP server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Requests handled at once; the rest wait in an unbounded queue.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// Maximum request body size in bytes (covers a whole multipart upload).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_concurrent_requests: default_max_concurrent_requests(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// On-disk layout of the image collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding originals, thumbnails and the index file.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// File name of the geo-index inside `upload_dir`.
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            index_file: default_index_file(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_concurrent_requests() -> usize {
    15
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_index_file() -> String {
    "GPSInfo.json".to_string()
}
