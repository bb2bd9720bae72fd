//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory, called at startup.
//! Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod openai_compatible;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and an optional API key.
///
/// `api_key` is sourced from `OPENAI_API_KEY` env (never TOML) and is `None`
/// for keyless local models.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "openai" | "openai-compatible" => {
            let oai = &config.openai;
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                oai.api_base_url.clone(),
                oai.model.clone(),
                oai.temperature,
                oai.max_tokens,
                oai.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiConfig;

    fn llm_config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.into(),
            openai: OpenAiConfig {
                api_base_url: "http://localhost:0/v1/chat/completions".into(),
                model: "test-model".into(),
                temperature: 0.5,
                max_tokens: 500,
                timeout_seconds: 1,
            },
        }
    }

    #[test]
    fn builds_dummy() {
        let p = build(&llm_config("dummy"), None).unwrap();
        assert!(matches!(p, LlmProvider::Dummy(_)));
    }

    #[test]
    fn builds_openai_aliases() {
        for name in ["openai", "openai-compatible"] {
            let p = build(&llm_config(name), Some("sk-test".into())).unwrap();
            assert!(matches!(p, LlmProvider::OpenAiCompatible(_)));
        }
    }

    #[test]
    fn unknown_provider_errors() {
        let err = build(&llm_config("bard"), None).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider(ref n) if n == "bard"));
    }
}
