use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variables consulted, in order, when no API key is configured.
pub const API_KEY_ENV_VARS: [&str; 2] = ["IMAGEFORGE_API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub image_service: ImageServiceConfig,

    #[serde(default)]
    pub gallery: GalleryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the browser front end (served with SPA fallback)
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageServiceConfig {
    /// API key presented to the image service.
    /// Falls back to `IMAGEFORGE_API_KEY`, then `GEMINI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds (default: 120)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash-image".to_string()
}
fn default_timeout() -> u64 {
    120
}

impl Default for ImageServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ImageServiceConfig {
    /// The configured key, or the first non-empty key from the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .filter_map(|var| std::env::var(var).ok())
                    .find(|key| !key.trim().is_empty())
            })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GalleryConfig {
    /// Directory holding the gallery database.
    /// Defaults to the config file's directory, or the working directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}
