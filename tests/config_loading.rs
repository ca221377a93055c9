//! Integration tests for configuration loading from disk.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::fs;
use std::path::Path;

use nowplaying::{
    NowPlayingError,
    config::{Config, ConfigPaths, LogLevel},
};
use tempfile::TempDir;

fn write(dir: &Path, filename: &str, content: &str) {
    fs::write(dir.join(filename), content).unwrap();
}

#[test]
fn missing_file_yields_defaults() {
    let temp = TempDir::new().unwrap();

    let config = Config::load_or_default(&temp.path().join("config.toml")).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn loads_every_section() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "config.toml",
        r#"
[general]
log_level = "trace"

[media]
denylist = ["B.exe"]
"#,
    );

    let config = Config::load_or_default(&temp.path().join("config.toml")).unwrap();

    assert_eq!(config.general.log_level, LogLevel::Trace);
    assert_eq!(config.media.denylist, vec!["B.exe"]);
}

#[test]
fn imports_sit_beneath_the_main_file() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "base.toml",
        r#"
[general]
log_level = "debug"

[media]
denylist = ["A.exe"]
"#,
    );
    write(
        temp.path(),
        "config.toml",
        r#"
imports = ["@base"]

[general]
log_level = "error"
"#,
    );

    let config = Config::load_with_imports(&temp.path().join("config.toml")).unwrap();

    assert_eq!(config.general.log_level, LogLevel::Error);
    assert_eq!(config.media.denylist, vec!["A.exe"]);
}

#[test]
fn nested_imports_resolve_relative_to_the_importing_file() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("shared")).unwrap();
    write(
        &temp.path().join("shared"),
        "media.toml",
        r#"
imports = ["@deny"]
"#,
    );
    write(
        &temp.path().join("shared"),
        "deny.toml",
        r#"
[media]
denylist = ["Teams.exe"]
"#,
    );
    write(temp.path(), "config.toml", r#"imports = ["@shared/media.toml"]"#);

    let config = Config::load_with_imports(&temp.path().join("config.toml")).unwrap();

    assert_eq!(config.media.denylist, vec!["Teams.exe"]);
}

#[test]
fn circular_imports_are_rejected() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "config.toml", r#"imports = ["@other"]"#);
    write(temp.path(), "other.toml", r#"imports = ["@config"]"#);

    let err = Config::load_with_imports(&temp.path().join("config.toml")).unwrap_err();

    let NowPlayingError::ConfigValidation { details, .. } = err else {
        panic!("expected circular import error, got {err}");
    };
    assert!(details.contains("config.toml -> other.toml -> config.toml"));
}

#[test]
fn missing_import_names_the_file() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "config.toml", r#"imports = ["@absent"]"#);

    let err = Config::load_with_imports(&temp.path().join("config.toml")).unwrap_err();

    let NowPlayingError::ImportError { path, .. } = err else {
        panic!("expected import error, got {err}");
    };
    assert!(path.ends_with("absent.toml"));
}

#[test]
fn invalid_values_are_reported() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "config.toml", "[general]\nlog_level = 3\n");

    let err = Config::load_with_imports(&temp.path().join("config.toml")).unwrap_err();

    assert!(matches!(err, NowPlayingError::ConfigValidation { .. }));
}

#[test]
fn config_paths_follow_xdg_config_home() {
    let temp = TempDir::new().unwrap();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp.path());
    }

    let main = ConfigPaths::main_config().unwrap();

    assert_eq!(main, temp.path().join("nowplaying").join("config.toml"));

    fs::create_dir_all(main.parent().unwrap()).unwrap();
    fs::write(&main, "[media]\ndenylist = [\"X.exe\"]\n").unwrap();
    let config = Config::load().unwrap();
    assert_eq!(config.media.denylist, vec!["X.exe"]);
}
