mod common;

use std::path::{Path, PathBuf};

use common::TempDir;
use tinyweb::config::Config;

#[test]
fn test_config_defaults() {
    let cfg = Config::default();
    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.server.read_buffer_size, 2048);
    assert_eq!(cfg.server.write_buffer_size, 1024);
    assert_eq!(cfg.site.doc_root, PathBuf::from("./root"));
    assert_eq!(cfg.users.path, PathBuf::from("./users.yaml"));
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_config_partial_yaml_keeps_defaults() {
    let cfg = Config::from_yaml(
        "server:\n  listen_addr: 0.0.0.0:3000\nsite:\n  doc_root: /srv/www\n",
    )
    .unwrap();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.server.read_buffer_size, 2048);
    assert_eq!(cfg.site.doc_root, PathBuf::from("/srv/www"));
    assert_eq!(cfg.users.path, PathBuf::from("./users.yaml"));
}

#[test]
fn test_config_empty_yaml_is_default() {
    let cfg = Config::from_yaml("").unwrap();
    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");
}

#[test]
fn test_config_rejects_bad_yaml() {
    assert!(Config::from_yaml("server: [1, 2").is_err());
    assert!(Config::from_yaml("server:\n  read_buffer_size: lots\n").is_err());
}

#[test]
fn test_config_overrides() {
    let mut cfg = Config::default();
    cfg.apply_overrides(Some("0.0.0.0:5000".to_string()), None);
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:5000");
    assert_eq!(cfg.site.doc_root, PathBuf::from("./root"));

    cfg.apply_overrides(None, Some("/var/www".to_string()));
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:5000");
    assert_eq!(cfg.site.doc_root, PathBuf::from("/var/www"));
}

#[test]
fn test_config_validate_buffer_sizes() {
    let mut cfg = Config::default();
    cfg.server.write_buffer_size = 100;
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.server.read_buffer_size = 16;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_from_file() {
    let dir = TempDir::new("config");
    let path = dir.path().join("tinyweb.yaml");
    std::fs::write(&path, "users:\n  path: /etc/tinyweb/users.yaml\n").unwrap();

    let cfg = Config::from_file(&path).unwrap();
    assert_eq!(cfg.users.path, PathBuf::from("/etc/tinyweb/users.yaml"));

    let missing = Config::from_file(Path::new("/nonexistent/tinyweb.yaml")).unwrap();
    assert_eq!(missing.server.listen_addr, "127.0.0.1:8080");
}
