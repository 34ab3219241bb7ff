//! Unit tests for configuration and graceful degradation
//!
//! Tests that manipulate WXMC_ROOT_FOLDER are marked with #[serial]
//! so they run sequentially, not in parallel.

use serial_test::serial;
use std::env;
use std::path::PathBuf;
use wxmc_common::config::{
    default_root_folder, RootFolderInitializer, RootFolderResolver, TomlConfig,
    DATABASE_FILE_NAME, MAX_TOKEN_TTL_MINUTES, ROOT_FOLDER_ENV,
};
use wxmc_common::Error;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let root_folder = default_root_folder();
    let config = TomlConfig::default();

    assert!(!root_folder.as_os_str().is_empty());
    assert!(root_folder.to_string_lossy().contains("wxmc"));
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.port, 8000);
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = RootFolderResolver::new().resolve();

    assert_eq!(root_folder, default_root_folder());
}

#[test]
#[serial]
fn test_resolver_priority_order() {
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/wxmc-from-toml")),
        ..TomlConfig::default()
    };

    // TOML beats compiled default
    env::remove_var(ROOT_FOLDER_ENV);
    let resolver = RootFolderResolver::new().with_toml(&toml);
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/wxmc-from-toml"));

    // Environment beats TOML
    env::set_var(ROOT_FOLDER_ENV, "/tmp/wxmc-from-env");
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/wxmc-from-env"));

    // CLI beats everything
    let resolver = resolver.with_cli_arg(Some(PathBuf::from("/tmp/wxmc-from-cli")));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/wxmc-from-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
fn test_initializer_creates_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("nested").join("wxmc");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join(DATABASE_FILE_NAME));

    // Second call is a no-op
    initializer.ensure_directory_exists().unwrap();
}

#[test]
fn test_toml_parse_full() {
    let config = TomlConfig::parse(
        r#"
        root_folder = "/srv/wxmc"
        bind_address = "0.0.0.0"
        port = 9100
        default_dataset = "/srv/wxmc/seattle.csv"
        allowed_categories = ["Rain", "sun", "hail"]
        token_ttl_minutes = 60
        max_upload_bytes = 2048
        cors_allowed_origins = ["http://localhost:5173"]

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.port, 9100);
    assert_eq!(config.bind_address, "0.0.0.0");
    assert_eq!(config.token_ttl_minutes, 60);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.category_set().to_vec(), vec!["hail", "rain", "sun"]);
}

#[test]
fn test_toml_parse_empty_uses_defaults() {
    let config = TomlConfig::parse("").unwrap();
    assert_eq!(config, TomlConfig::default());
    assert_eq!(
        config.category_set().to_vec(),
        vec!["drizzle", "fog", "rain", "snow", "sun"]
    );
}

#[test]
fn test_toml_parse_rejects_invalid_values() {
    assert!(TomlConfig::parse("allowed_categories = []").is_err());
    assert!(TomlConfig::parse("token_ttl_minutes = 0").is_err());
    assert!(TomlConfig::parse("token_ttl_minutes = 10000000000").is_err());
    assert!(
        TomlConfig::parse(&format!("token_ttl_minutes = {}", MAX_TOKEN_TTL_MINUTES + 1)).is_err()
    );
    assert_eq!(
        TomlConfig::parse(&format!("token_ttl_minutes = {}", MAX_TOKEN_TTL_MINUTES))
            .unwrap()
            .token_ttl_minutes,
        MAX_TOKEN_TTL_MINUTES
    );
    assert!(TomlConfig::parse("port = \"eighty\"").is_err());
}

#[test]
fn test_load_missing_file_is_config_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("absent.toml");

    let err = TomlConfig::load(&missing).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {:?}", err);
}

#[test]
fn test_load_reads_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("wxmc.toml");
    std::fs::write(&path, "port = 8123\n").unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.port, 8123);
    assert_eq!(config.token_ttl_minutes, 30);
}
