// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::tempdir;
use yare::parameterized;

#[test]
fn config_default_values() {
    let config = Config::default();
    assert_eq!(config.reconnect_delays_ms, vec![0, 2_000, 10_000, 30_000]);
    assert_eq!(config.typing_timeout(), Duration::from_secs(3));
    assert_eq!(config.typing_quiet(), Duration::from_millis(500));
    assert_eq!(config.page_size, 50);
    assert!(config.validate().is_ok());
}

#[test]
fn config_parse_empty_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn config_parse_overrides() {
    let config = Config::parse(
        r#"
hub_url = "wss://chat.example.com/hubs/chat"
reconnect_delays_ms = [0, 500]
page_size = 20
"#,
    )
    .unwrap();

    assert_eq!(config.hub_url, "wss://chat.example.com/hubs/chat");
    assert_eq!(
        config.reconnect_delays(),
        vec![Duration::ZERO, Duration::from_millis(500)]
    );
    assert_eq!(config.page_size, 20);
    assert_eq!(config.typing_timeout_ms, 3_000);
}

#[parameterized(
    empty_delays = { "reconnect_delays_ms = []", "reconnect_delays_ms" },
    zero_timeout = { "typing_timeout_ms = 0", "typing timers" },
    zero_quiet = { "typing_quiet_ms = 0", "typing timers" },
    zero_page = { "page_size = 0", "page_size" },
    zero_buffer = { "command_buffer = 0", "command_buffer" },
    http_hub = { "hub_url = \"http://localhost\"", "ws://" },
)]
fn config_parse_rejects_invalid(content: &str, expected: &str) {
    let err = Config::parse(content).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains(expected));
}

#[test]
fn config_parse_rejects_bad_toml() {
    let err = Config::parse("page_size = \"many\"").unwrap_err();
    assert!(matches!(err, Error::Toml(_)));
}

#[test]
fn config_load_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "typing_quiet_ms = 250\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.typing_quiet(), Duration::from_millis(250));
}

#[test]
fn config_load_or_default_when_missing() {
    let dir = tempdir().unwrap();
    let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}
