//! Configuration loading with env-var overrides.
//!
//! Reads a TOML file (`-f/--config`, then `RELAY_CONFIG`, then
//! `config/default.toml`), resolves it into typed config, and applies
//! environment overrides. Credentials only ever come from the environment:
//! `OPENAI_API_KEY`, `TELEGRAM_API_KEY`. `MODEL_ENGINE` and
//! `RELAY_LOG_LEVEL` override their TOML counterparts.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::error::AppError;

/// Used when neither `-f` nor `RELAY_CONFIG` names a file. Unlike an
/// explicitly named file, it is allowed to be missing.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Persona seeded as the system message of every new conversation.
pub const DEFAULT_PERSONA: &str = "Eres un asistente experto en medir el nivel de madurez de tecnologías utilizando la métrica de 9 niveles del TRL creada por la nasa, y eres capaz de preguntar a los usuarios sobre sus tecnologías para evaluar el nivel de madurez tecnológico que tienen, mientras resuelves sus dudas sobre el TRL.";

/// Reply relayed when the completion call fails.
pub const DEFAULT_FALLBACK_REPLY: &str = "Ocurrió un Error :(";

/// Message text that triggers a transcript export.
pub const DEFAULT_EXPORT_TRIGGER: &str = "pushtohub";

/// Relay loop behaviour.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// System message text for new transcripts.
    pub persona: String,
    /// Text relayed instead of a completion when generation fails.
    pub fallback_reply: String,
    /// Exact user text that triggers a full export after the turn.
    pub export_trigger: String,
    /// JSONL export destination (already expanded, no `~`).
    pub export_path: PathBuf,
    /// Pause after a poll that returned nothing.
    pub idle_pause: Duration,
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// API root, without the `/bot<token>` suffix.
    pub api_base_url: String,
    /// Server-side long-poll timeout passed to `getUpdates`.
    pub poll_timeout_seconds: u64,
}

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    pub temperature: f32,
    /// Cap on generated tokens per reply.
    pub max_tokens: u32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM subsystem configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"openai"` or `"dummy"`).
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    pub openai: OpenAiConfig,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub relay: RelayConfig,
    pub telegram: TelegramConfig,
    pub llm: LlmConfig,
    /// From `OPENAI_API_KEY`; `None` for keyless local models.
    pub llm_api_key: Option<String>,
    /// From `TELEGRAM_API_KEY`. Required to run, checked at startup.
    pub telegram_token: Option<String>,
}

/// Environment-sourced values layered over the TOML.
///
/// Tests build this directly instead of mutating process env vars.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub log_level: Option<String>,
    pub model: Option<String>,
    pub llm_api_key: Option<String>,
    pub telegram_token: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build overrides from any variable source. Empty or whitespace-only
    /// values count as unset, so a copied `.env.example` with blank keys
    /// behaves like a missing one.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            log_level: var("RELAY_LOG_LEVEL"),
            model: var("MODEL_ENGINE"),
            llm_api_key: var("OPENAI_API_KEY"),
            telegram_token: var("TELEGRAM_API_KEY"),
        }
    }
}

/// Raw TOML shape, the `serde` target before resolution.
#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    relay: RawRelay,
    #[serde(default)]
    telegram: RawTelegram,
    #[serde(default)]
    llm: RawLlm,
}

#[derive(Deserialize)]
struct RawRelay {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_persona")]
    persona: String,
    #[serde(default = "default_fallback_reply")]
    fallback_reply: String,
    #[serde(default = "default_export_trigger")]
    export_trigger: String,
    #[serde(default = "default_export_path")]
    export_path: String,
    #[serde(default = "default_idle_pause_ms")]
    idle_pause_ms: u64,
}

impl Default for RawRelay {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            persona: default_persona(),
            fallback_reply: default_fallback_reply(),
            export_trigger: default_export_trigger(),
            export_path: default_export_path(),
            idle_pause_ms: default_idle_pause_ms(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_persona() -> String { DEFAULT_PERSONA.to_string() }
fn default_fallback_reply() -> String { DEFAULT_FALLBACK_REPLY.to_string() }
fn default_export_trigger() -> String { DEFAULT_EXPORT_TRIGGER.to_string() }
fn default_export_path() -> String { "saved_conversations.jsonl".to_string() }
fn default_idle_pause_ms() -> u64 { 1000 }

#[derive(Deserialize)]
struct RawTelegram {
    #[serde(default = "default_telegram_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_poll_timeout_seconds")]
    poll_timeout_seconds: u64,
}

impl Default for RawTelegram {
    fn default() -> Self {
        Self {
            api_base_url: default_telegram_api_base_url(),
            poll_timeout_seconds: default_poll_timeout_seconds(),
        }
    }
}

fn default_telegram_api_base_url() -> String { "https://api.telegram.org".to_string() }
fn default_poll_timeout_seconds() -> u64 { 100 }

#[derive(Deserialize)]
struct RawLlm {
    /// `default = "..."` in `[llm]`: which provider to use.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            openai: RawOpenAiConfig::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            max_tokens: default_openai_max_tokens(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

fn default_llm_provider() -> String { "openai".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-3.5-turbo".to_string() }
fn default_openai_temperature() -> f32 { 0.5 }
fn default_openai_max_tokens() -> u32 { 500 }
fn default_openai_timeout_seconds() -> u64 { 60 }

/// Load config, picking the file from `config_path`, `RELAY_CONFIG` or
/// [`DEFAULT_CONFIG_PATH`], with overrides from the process environment.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = EnvOverrides::from_env();
    let explicit = config_path
        .map(str::to_string)
        .or_else(|| env::var("RELAY_CONFIG").ok().filter(|p| !p.trim().is_empty()));

    match explicit {
        Some(path) => load_from(Path::new(&path), &overrides),
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                load_from(path, &overrides)
            } else {
                from_toml_str("", "<built-in defaults>", &overrides)
            }
        }
    }
}

/// Internal loader. Accepts an explicit path and overrides.
pub fn load_from(path: &Path, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    from_toml_str(&raw, &path.display().to_string(), overrides)
}

fn from_toml_str(raw: &str, source: &str, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let parsed: RawConfig = toml::from_str(raw)
        .map_err(|e| AppError::Config(format!("parse error in {source}: {e}")))?;

    let r = parsed.relay;
    let o = parsed.llm.openai;

    Ok(Config {
        log_level: overrides.log_level.clone().unwrap_or(r.log_level),
        relay: RelayConfig {
            persona: r.persona,
            fallback_reply: r.fallback_reply,
            export_trigger: r.export_trigger,
            export_path: expand_home(&r.export_path),
            idle_pause: Duration::from_millis(r.idle_pause_ms),
        },
        telegram: TelegramConfig {
            api_base_url: parsed.telegram.api_base_url,
            poll_timeout_seconds: parsed.telegram.poll_timeout_seconds,
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: o.api_base_url,
                model: overrides.model.clone().unwrap_or(o.model),
                temperature: o.temperature,
                max_tokens: o.max_tokens,
                timeout_seconds: o.timeout_seconds,
            },
        },
        llm_api_key: overrides.llm_api_key.clone(),
        telegram_token: overrides.telegram_token.clone(),
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for unit tests: dummy LLM, no API keys, no external calls.
#[cfg(test)]
impl Config {
    pub fn test_default(export_path: &Path) -> Self {
        Self {
            log_level: "info".into(),
            relay: RelayConfig {
                persona: "test persona".into(),
                fallback_reply: DEFAULT_FALLBACK_REPLY.into(),
                export_trigger: DEFAULT_EXPORT_TRIGGER.into(),
                export_path: export_path.to_path_buf(),
                idle_pause: Duration::from_millis(1000),
            },
            telegram: TelegramConfig {
                api_base_url: "http://localhost:0".into(),
                poll_timeout_seconds: 0,
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.5,
                    max_tokens: 500,
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
            telegram_token: Some("TOKEN".into()),
        }
    }
}
