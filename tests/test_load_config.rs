use std::env;
use std::fs::write;

use fedora_components::load_config::{load_config, CliConfig, PASSWORD_ENV};
use serial_test::serial;
use tempfile::NamedTempFile;

/// A full static config plus FEDORA_PASSWORD in the environment produces a complete config.
#[test]
#[serial]
fn test_load_config_success_injects_password_from_env() {
    let config_yaml = r#"
repository:
  protocol: https
  host: monk.example.edu
  port: 443
  user: reader
  timeout_secs: 30
search:
  collection_pattern: "monk:coll-*"
  work_prefix: "monk:work-"
  max_results: 500
membership:
  predicate: "info:fedora/rel#isMemberOf"
  super_collection: "monk:all"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();
    env::set_var(PASSWORD_ENV, "top-secret-test-password");

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.repository.base_url(), "https://monk.example.edu:443/fedora");
    assert_eq!(config.repository.user, "reader");
    assert_eq!(config.repository.timeout_secs, 30);
    assert_eq!(
        config.repository.password.as_deref(),
        Some("top-secret-test-password")
    );
    assert_eq!(config.search.collection_pattern, "monk:coll-*");
    assert_eq!(config.search.work_prefix, "monk:work-");
    assert_eq!(config.search.max_results, 500);
    assert_eq!(config.membership.super_collection, "monk:all");

    env::remove_var(PASSWORD_ENV);
}

/// Keys that are left out fall back to their defaults; no password means anonymous access.
#[test]
#[serial]
fn test_load_config_partial_file_uses_defaults() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "repository:\n  host: fedora.local\n").unwrap();
    env::remove_var(PASSWORD_ENV);

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.repository.base_url(), "http://fedora.local:8080/fedora");
    assert_eq!(config.repository.user, "fedoraAdmin");
    assert!(config.repository.password.is_none());
    assert_eq!(config.search.collection_pattern, "monk:collection-*");
    assert_eq!(config.search.work_prefix, "monk:tcp-");
    assert_eq!(config.search.max_results, 10_000);
}

#[test]
#[serial]
fn test_load_config_empty_file_is_all_defaults() {
    let config_file = NamedTempFile::new().expect("temp file");
    env::remove_var(PASSWORD_ENV);

    let config = load_config(config_file.path()).expect("Empty config should load");
    assert_eq!(config.repository.base_url(), "http://localhost:8080/fedora");
}

/// A password written into the file is ignored: secrets only come from the environment.
#[test]
#[serial]
fn test_password_in_file_is_ignored() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "repository:\n  password: leaked\n").unwrap();
    env::remove_var(PASSWORD_ENV);

    let config = load_config(config_file.path()).expect("Config should load");
    assert!(config.repository.password.is_none());
}

#[test]
fn test_load_config_errors_on_missing_file() {
    let result = load_config("/nonexistent/fedora-components.yaml");
    assert!(result.is_err(), "Missing file must be an error");
}

#[test]
fn test_load_config_errors_on_invalid_yaml() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "repository:\n  port: not-a-port\n").unwrap();

    let err = load_config(config_file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config YAML"));
}

#[test]
#[serial]
fn test_from_env_reads_password() {
    env::set_var(PASSWORD_ENV, "pw");
    let config = CliConfig::from_env();
    assert_eq!(config.repository.password.as_deref(), Some("pw"));
    env::remove_var(PASSWORD_ENV);
}
