use std::fs;

use statviz_core::{ConfigOverrides, CoreError, ServiceConfig};

#[test]
fn explicit_config_file_is_loaded() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("custom.toml");
    fs::write(
        &path,
        "[backend]\nmode = \"mock\"\n\n[upload]\nenforce_size_limit = false\n",
    )
    .expect("write config");

    let config = ServiceConfig::load(Some(&path)).expect("load");

    assert_eq!(config.backend.mode.to_string(), "mock");
    assert_eq!(config.upload_policy().max_spreadsheet_bytes, None);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = ServiceConfig::load(Some(&dir.path().join("absent.toml"))).expect_err("missing");
    assert!(matches!(err, CoreError::ConfigRead { .. }));
}

#[test]
fn cli_can_lift_the_upload_limit() {
    let mut config = ServiceConfig::default();
    config
        .apply_overrides(&ConfigOverrides {
            enforce_size_limit: Some(false),
            timeout_secs: Some(5),
            ..ConfigOverrides::default()
        })
        .expect("overrides");
    assert_eq!(config.upload_policy().max_spreadsheet_bytes, None);
    assert_eq!(config.timeout().as_secs(), 5);
}
