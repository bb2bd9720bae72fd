//! Tests for the shipped configuration files.

use std::fs;
use std::path::Path;
use std::time::Duration;

use relay_bot::config::{self, EnvOverrides};

#[test]
fn test_default_config_exists() {
    assert!(fs::metadata("config/default.toml").is_ok(), "config/default.toml missing");
}

#[test]
fn test_default_config_loads() {
    let cfg = config::load_from(Path::new("config/default.toml"), &EnvOverrides::default())
        .expect("shipped config must parse");
    assert_eq!(cfg.llm.provider, "openai");
    assert_eq!(cfg.llm.openai.temperature, 0.5);
    assert_eq!(cfg.llm.openai.max_tokens, 500);
    assert_eq!(cfg.telegram.poll_timeout_seconds, 100);
    assert_eq!(cfg.relay.idle_pause, Duration::from_secs(1));
    assert_eq!(cfg.relay.export_trigger, "pushtohub");
}

#[test]
fn test_default_config_matches_builtin_defaults() {
    // The persona is left commented out so the built-in one applies.
    let cfg = config::load_from(Path::new("config/default.toml"), &EnvOverrides::default()).unwrap();
    assert_eq!(cfg.relay.persona, config::DEFAULT_PERSONA);
    assert_eq!(cfg.relay.fallback_reply, config::DEFAULT_FALLBACK_REPLY);
}

#[test]
fn test_default_config_has_no_secrets() {
    let text = fs::read_to_string("config/default.toml").unwrap();
    for key in ["api_key", "API_KEY", "sk-"] {
        assert!(
            !text.lines().any(|l| !l.trim_start().starts_with('#') && l.contains(key)),
            "config/default.toml should not set '{key}'"
        );
    }
}

#[test]
fn test_env_example_lists_credentials() {
    let text = fs::read_to_string(".env.example").unwrap();
    assert!(text.contains("OPENAI_API_KEY"));
    assert!(text.contains("TELEGRAM_API_KEY"));
    assert!(text.contains("MODEL_ENGINE"));
}
