//! Config file discovery tests
//!
//! Tests that manipulate WFIMPORT_CONFIG are marked with #[serial].

use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;
use wfimport_common::config::{load_config, resolve_config_path, CONFIG_ENV_VAR};
use wfimport_common::Error;

#[test]
#[serial]
fn test_env_path_used_when_no_cli_arg() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "service_url = \"http://env-config:8188\"").unwrap();
    std::env::set_var(CONFIG_ENV_VAR, file.path());

    assert_eq!(resolve_config_path(None), Some(file.path().to_path_buf()));
    let config = load_config(None).unwrap();
    assert_eq!(config.service_url, "http://env-config:8188");

    std::env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_path_beats_env() {
    std::env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
    let cli = PathBuf::from("/tmp/from-cli.toml");

    assert_eq!(resolve_config_path(Some(&cli)), Some(cli));

    std::env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_error() {
    std::env::set_var(CONFIG_ENV_VAR, "/nonexistent/wfimport/config.toml");

    let err = load_config(None).unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    std::env::remove_var(CONFIG_ENV_VAR);
}
