//! Configuration tests

use peernode::{Config, ErrorKind, NodeError};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_empty_toml_uses_defaults() {
    let config = Config::from_toml("").unwrap();

    assert!(config.home_dir.ends_with("hlf-easy"));
    assert_eq!(config.peer.binary, PathBuf::from("peer"));
    assert_eq!(config.peer.core_template, None);
    assert_eq!(config.stop_grace_period(), None);
    assert_eq!(config.status_interval(), Duration::from_secs(5));
}

#[test]
fn test_full_toml() {
    let config = Config::from_toml(
        r#"
home_dir = "/srv/fabric"

[peer]
binary = "/opt/fabric/bin/peer"
core_template = "/etc/peerctl/core.yaml.j2"
stop_grace_period_secs = 30
status_interval_secs = 2
"#,
    )
    .unwrap();

    assert_eq!(config.home_dir, PathBuf::from("/srv/fabric"));
    assert_eq!(config.peers_dir(), PathBuf::from("/srv/fabric/peers"));
    assert_eq!(config.cas_dir(), PathBuf::from("/srv/fabric/cas"));
    assert_eq!(config.peer.binary, PathBuf::from("/opt/fabric/bin/peer"));
    assert_eq!(
        config.peer.core_template,
        Some(PathBuf::from("/etc/peerctl/core.yaml.j2"))
    );
    assert_eq!(config.stop_grace_period(), Some(Duration::from_secs(30)));
    assert_eq!(config.status_interval(), Duration::from_secs(2));
}

#[test]
fn test_load_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("peerctl.toml");
    std::fs::write(&path, "home_dir = \"/data/hlf\"\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.home_dir, PathBuf::from("/data/hlf"));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let err = Config::load(&temp.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, NodeError::Io { .. }));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_invalid_toml_is_config_error() {
    let err = Config::from_toml("home_dir = ").unwrap_err();
    assert!(matches!(err, NodeError::Config(_)));
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_zero_status_interval_rejected() {
    let err = Config::from_toml("[peer]\nstatus_interval_secs = 0\n").unwrap_err();
    assert!(matches!(err, NodeError::Config(ref msg) if msg.contains("status_interval_secs")));
}

#[test]
fn test_zero_grace_period_rejected() {
    let err = Config::from_toml("[peer]\nstop_grace_period_secs = 0\n").unwrap_err();
    assert!(matches!(err, NodeError::Config(ref msg) if msg.contains("stop_grace_period_secs")));
}

#[test]
fn test_empty_binary_rejected() {
    let err = Config::from_toml("[peer]\nbinary = \"\"\n").unwrap_err();
    assert!(matches!(err, NodeError::Config(_)));
}

#[test]
fn test_with_home_dir_is_valid() {
    let config = Config::with_home_dir("/tmp/peer-home");
    config.validate().unwrap();
    assert_eq!(config.peers_dir(), PathBuf::from("/tmp/peer-home/peers"));
}
