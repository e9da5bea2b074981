use std::process::{Command, Output};
use tempfile::TempDir;

fn update_compose(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_update-compose"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run update-compose")
}

#[test]
fn test_base_is_not_a_deployable_system() {
    let output = update_compose(&["base"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Don't know base as system option"));
}

#[test]
fn test_unknown_profile_is_usage_error() {
    let output = update_compose(&["staging"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Don't know compose type staging"));
}

#[test]
fn test_bad_config_file_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("update-compose.toml");
    std::fs::write(&path, "[deploy]\nexpose_ports = \"timetracker-web:notaport\"\n").unwrap();

    let output = update_compose(&["trial", "--config", path.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("expose_ports"));
}

#[test]
fn test_malformed_config_file_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("update-compose.toml");
    std::fs::write(&path, "[registry\npage_size = 1\n").unwrap();

    let output = update_compose(&["trial", "--config", path.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("TOML parsing error"));
}
