//! Application-wide error types.

use thiserror::Error;

use crate::llm::ProviderError;
use crate::telegram::TelegramError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("telegram error: {0}")]
    Telegram(#[from] TelegramError),

    #[error("llm error: {0}")]
    Llm(#[from] ProviderError),

    #[error("export error: {0}")]
    Export(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("missing field".into());
        assert!(e.to_string().contains("config error"));
        assert!(e.to_string().contains("missing field"));
    }

    #[test]
    fn logger_error_display() {
        let e = AppError::Logger("already initialized".into());
        assert!(e.to_string().contains("already initialized"));
    }

    #[test]
    fn provider_error_converts() {
        let e: AppError = ProviderError::UnknownProvider("bogus".into()).into();
        assert!(e.to_string().starts_with("llm error"));
        assert!(e.to_string().contains("bogus"));
    }

    #[test]
    fn telegram_error_converts() {
        let e: AppError = TelegramError::Api("Unauthorized".into()).into();
        assert!(e.to_string().starts_with("telegram error"));
        let _: &dyn Error = &e;
    }
}
