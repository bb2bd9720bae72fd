//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! A completion takes the whole transcript as context and yields either the
//! reply text or a [`ProviderError`] whose [`FailureKind`] the relay loop
//! uses to pick its log line before substituting the fallback reply.

pub mod providers;

use std::fmt;

use thiserror::Error;

use crate::conversation::Message;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    /// The API answered with an error, or answered with something unusable.
    #[error("provider request failed: {0}")]
    Request(String),
    /// The API could not be reached (connect failure or timeout).
    #[error("provider connection failed: {0}")]
    Connection(String),
    /// HTTP 429.
    #[error("provider rate limit exceeded: {0}")]
    RateLimit(String),
}

/// Classified reason a completion did not produce text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Request,
    Connection,
    RateLimit,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Request => "request",
            FailureKind::Connection => "connection",
            FailureKind::RateLimit => "rate_limit",
        };
        f.write_str(s)
    }
}

impl ProviderError {
    /// Failure class of a completion error. A build-time `UnknownProvider`
    /// never reaches the relay loop and counts as a request failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::Connection(_) => FailureKind::Connection,
            ProviderError::RateLimit(_) => FailureKind::RateLimit,
            ProviderError::Request(_) | ProviderError::UnknownProvider(_) => FailureKind::Request,
        }
    }
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new `complete` arm.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send the ordered `messages` to the provider and return its text reply.
    pub async fn complete(&self, messages: &[Message]) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(messages).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(messages).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        assert_eq!(ProviderError::Request("x".into()).kind(), FailureKind::Request);
        assert_eq!(ProviderError::Connection("x".into()).kind(), FailureKind::Connection);
        assert_eq!(ProviderError::RateLimit("x".into()).kind(), FailureKind::RateLimit);
        assert_eq!(ProviderError::UnknownProvider("x".into()).kind(), FailureKind::Request);
    }

    #[test]
    fn kind_display() {
        assert_eq!(FailureKind::RateLimit.to_string(), "rate_limit");
        assert_eq!(FailureKind::Connection.to_string(), "connection");
    }

    #[tokio::test]
    async fn enum_dispatch_reaches_dummy() {
        let p = LlmProvider::Dummy(providers::dummy::DummyProvider);
        let reply = p.complete(&[Message::user("ping")]).await.unwrap();
        assert_eq!(reply, "[echo] ping");
    }
}
