mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./imageforge.toml",
        "~/.config/imageforge/config.toml",
        "/etc/imageforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Directory holding the gallery database.
///
/// An explicit `gallery.data_dir` wins (with `~` expanded), then the config
/// file's directory, then the working directory.
pub fn resolve_data_dir(config: &Config, config_path: Option<&Path>) -> PathBuf {
    if let Some(dir) = &config.gallery.data_dir {
        return PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).as_ref());
    }

    config_path
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if let Some(dir) = &config.server.static_dir {
        if !dir.exists() {
            tracing::warn!("Static directory does not exist: {:?}", dir);
        }
    }

    let service = &config.image_service;
    if !service.base_url.starts_with("http://") && !service.base_url.starts_with("https://") {
        anyhow::bail!(
            "image_service.base_url must be an http(s) URL, got '{}'",
            service.base_url
        );
    }
    if service.model.trim().is_empty() {
        anyhow::bail!("image_service.model cannot be empty");
    }
    if service.timeout_secs == 0 {
        anyhow::bail!("image_service.timeout_secs must be greater than 0");
    }

    Ok(())
}
