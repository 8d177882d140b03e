// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration loading

use camera_controls::app::SynchronizerOptions;
use camera_controls::{AppError, Config};
use std::io::Write;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.width, 640);
    assert_eq!(config.height, 480);
    assert!(config.preview, "Preview should be enabled by default");
    assert_eq!(config.device, None);
}

#[test]
fn test_load_from_explicit_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "width": 1280, "height": 720, "device": "/dev/video2", "log_filter": "debug" }}"#
    )
    .unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.width, 1280);
    assert_eq!(config.height, 720);
    assert_eq!(config.log_filter.as_deref(), Some("debug"));

    let options = SynchronizerOptions::from(&config);
    assert_eq!(options.initial_device.as_deref(), Some("/dev/video2"));
    assert_eq!((options.width, options.height), (1280, 720));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load(Some(dir.path().join("absent.json").as_path()));
    assert!(result.is_err());
}

#[test]
fn test_malformed_file_is_a_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "width = 3").unwrap();

    match Config::load(Some(file.path())) {
        Err(AppError::Config(_)) => {}
        other => panic!("expected a config error, got {:?}", other),
    }
}
