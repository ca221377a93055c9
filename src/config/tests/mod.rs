//! Unit tests for config module
//!
//! Tests configuration types, defaults, and serialization.
//! No filesystem dependencies - all in-memory.

use crate::config::{Config, LogLevel, MediaConfig};

#[test]
fn config_default() {
    let config = Config::default();

    assert_eq!(config.general.log_level, LogLevel::Info);
    assert!(config.media.denylist.is_empty());
}

#[test]
fn config_serialize_toml() {
    let config = Config::default();

    let toml_str = toml::to_string(&config).unwrap();
    assert!(toml_str.contains("[general]"));
    assert!(toml_str.contains("log_level = \"info\""));
    assert!(toml_str.contains("[media]"));
}

#[test]
fn config_deserialize_toml() {
    let toml_str = r#"
        [general]
        log_level = "debug"

        [media]
        denylist = ["A.exe", "B.exe"]
    "#;

    let config: Config = toml::from_str(toml_str).unwrap();

    assert_eq!(config.general.log_level, LogLevel::Debug);
    assert_eq!(config.media.denylist, vec!["A.exe", "B.exe"]);
}

#[test]
fn config_serialize_roundtrip() {
    let original = Config {
        media: MediaConfig {
            denylist: vec!["Spotify.exe".to_string()],
        },
        ..Default::default()
    };

    let toml_str = toml::to_string(&original).unwrap();
    let deserialized: Config = toml::from_str(&toml_str).unwrap();

    assert_eq!(original, deserialized);
}

#[test]
fn config_empty_toml() {
    let config: Config = toml::from_str("").unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn config_invalid_log_level() {
    let result: Result<Config, toml::de::Error> = toml::from_str(
        r#"
        [general]
        log_level = "loud"
    "#,
    );

    assert!(result.is_err());
}

#[test]
fn config_unknown_fields() {
    let toml_with_unknown = r#"
        imports = ["@base"]

        [general]
        log_level = "warn"
        unknown_field = "should be ignored"

        [unknown_section]
        some_field = "ignored"
    "#;

    let config: Config = toml::from_str(toml_with_unknown).unwrap();
    assert_eq!(config.general.log_level, LogLevel::Warn);
}

#[test]
fn config_schema_lists_sections() {
    let schema = schemars::schema_for!(Config);
    let json = serde_json::to_value(&schema).unwrap();

    assert!(json["properties"]["general"].is_object());
    assert!(json["properties"]["media"].is_object());
}
