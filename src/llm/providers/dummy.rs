//! Dummy LLM provider: echoes the latest user message prefixed with `[echo]`.
//! Used for running the relay loop without a real API key.

use crate::conversation::{Message, Role};
use crate::llm::ProviderError;

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let last = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(format!("[echo] {last}"))
    }
}
