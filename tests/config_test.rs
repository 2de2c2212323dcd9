//! Configuration loading tests.

use imageforge::config::{load_config, load_config_or_default, resolve_data_dir, Config};
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_load_full_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[server]
host = "0.0.0.0"
port = 9090

[image_service]
api_key = "from-file"
model = "gemini-test"
timeout_secs = 30

[gallery]
data_dir = "/var/lib/imageforge"
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.image_service.model, "gemini-test");
    assert_eq!(config.image_service.timeout_secs, 30);
    assert_eq!(
        config.image_service.resolve_api_key().as_deref(),
        Some("from-file")
    );
    assert_eq!(
        resolve_data_dir(&config, Some(&path)),
        PathBuf::from("/var/lib/imageforge")
    );
}

#[test]
fn test_partial_config_uses_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("imageforge.toml");
    std::fs::write(&path, "[server]\nport = 3000\n").unwrap();

    let config = load_config(&path).unwrap();
    let defaults = Config::default();
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, defaults.server.host);
    assert_eq!(config.image_service.base_url, defaults.image_service.base_url);
    assert_eq!(config.image_service.model, defaults.image_service.model);

    // Without gallery.data_dir the database lives next to the config file.
    assert_eq!(resolve_data_dir(&config, Some(&path)), dir.path());
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    std::fs::write(&path, "[server]\nport = 0\n").unwrap();
    assert!(load_config(&path).is_err());

    std::fs::write(&path, "[image_service]\nbase_url = \"ftp://example.com\"\n").unwrap();
    assert!(load_config(&path).is_err());

    std::fs::write(&path, "this is not toml = = =").unwrap();
    assert!(load_config(&path).is_err());
}

#[test]
fn test_explicit_missing_path_is_an_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(load_config_or_default(Some(&missing)).is_err());
}
