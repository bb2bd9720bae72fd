//! OpenAI-compatible chat completion provider (`/v1/chat/completions`).
//!
//! The transcript is sent as-is as the `messages` array. All OpenAI wire
//! types are private to this module; callers only see the reply text or a
//! classified [`ProviderError`].

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::conversation::Message;
use crate::llm::ProviderError;

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for any HTTP endpoint implementing `/v1/chat/completions`.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Build a provider from config values and an optional API key.
    ///
    /// When `api_key` is present it is sent as `Authorization: Bearer <key>`
    /// on every request.
    pub fn new(
        api_base_url: String,
        model: String,
        temperature: f32,
        max_tokens: u32,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, temperature, max_tokens, api_key })
    }

    /// One chat-completion round-trip over the full `messages` history.
    pub async fn complete(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            model = %payload.model,
            temperature = payload.temperature,
            messages = messages.len(),
            "sending LLM request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let mut req = self.client.post(&self.api_base_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, "LLM HTTP request failed (transport)");
            classify_transport(e)
        })?;

        let response = check_status(response).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        debug!(choices = parsed.choices.len(), "received LLM response");

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Request("missing content in response".into()))
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// Error envelope used by OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

fn classify_transport(e: reqwest::Error) -> ProviderError {
    if e.is_connect() || e.is_timeout() {
        ProviderError::Connection(e.to_string())
    } else {
        ProviderError::Request(e.to_string())
    }
}

/// Consume the response and return it if successful, or a classified error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let code = env.error.code.map(|v| match v {
            serde_json::Value::String(s) => format!(" [code={s}]"),
            other => format!(" [code={other}]"),
        }).unwrap_or_default();
        format!("HTTP {status}{code}: {}", env.error.message)
    } else {
        format!("HTTP {status}: {body}")
    };

    error!(%status, %message, "LLM request returned HTTP error");
    if status == StatusCode::TOO_MANY_REQUESTS {
        Err(ProviderError::RateLimit(message))
    } else {
        Err(ProviderError::Request(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(url: String, key: Option<&str>) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(url, "test-model".into(), 0.5, 500, 5, key.map(Into::into))
            .unwrap()
    }

    fn transcript() -> Vec<Message> {
        vec![Message::system("be brief"), Message::user("hi")]
    }

    #[tokio::test]
    async fn sends_history_and_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "temperature": 0.5,
                "max_tokens": 500,
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hi" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "hello there" } },
                    { "message": { "role": "assistant", "content": "ignored" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let p = provider(format!("{}/v1/chat/completions", server.uri()), Some("sk-test"));
        assert_eq!(p.complete(&transcript()).await.unwrap(), "hello there");
    }

    #[tokio::test]
    async fn status_429_is_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "slow down", "code": "rate_limit_exceeded" }
            })))
            .mount(&server)
            .await;

        let err = provider(server.uri(), None).complete(&transcript()).await.unwrap_err();
        match err {
            ProviderError::RateLimit(msg) => {
                assert!(msg.contains("slow down"));
                assert!(msg.contains("rate_limit_exceeded"));
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_request_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = provider(server.uri(), None).complete(&transcript()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Request(ref m) if m.contains("boom")));
    }

    #[tokio::test]
    async fn missing_content_is_request_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = provider(server.uri(), None).complete(&transcript()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Request(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_connection_failure() {
        // Port 1 on loopback is closed in any sane test environment.
        let p = provider("http://127.0.0.1:1/v1/chat/completions".into(), None);
        let err = p.complete(&transcript()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Connection(_)), "got {err:?}");
    }
}
