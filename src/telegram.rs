//! Telegram Bot API client for long-poll `getUpdates` and `sendMessage`.
//!
//! Only the fields the relay needs are modelled. Updates that are not plain
//! messages (edits, callbacks, joins…) deserialise with `message: None` and
//! are skipped by the caller after advancing the offset.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::TelegramConfig;
use crate::conversation::ChatId;

// ── Constants ────────────────────────────────────────────────────────────────

/// Telegram has a 4096 character limit per message.
/// We chunk at 4000 to be safe.
const MAX_MESSAGE_LENGTH: usize = 4000;

/// Extra headroom on the HTTP timeout so the server-side long poll always
/// finishes first.
const POLL_TIMEOUT_SLACK_SECS: u64 = 10;

// ── Error ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("http error: {0}")]
    Http(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("decode error: {0}")]
    Decode(String),
}

// ── Wire types ───────────────────────────────────────────────────────────────

/// One inbound event from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    /// Absent for stickers, photos and other non-text messages.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a ChatId,
    text: &'a str,
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Thin Bot API client bound to one bot token.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: Client,
    /// `{api_base_url}/bot{token}`; method names are appended to this.
    bot_url: String,
    poll_timeout_seconds: u64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig, token: &str) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_seconds + POLL_TIMEOUT_SLACK_SECS))
            .build()
            .map_err(|e| TelegramError::Http(format!("failed to build HTTP client: {e}")))?;

        let base = config.api_base_url.trim_end_matches('/');
        Ok(Self {
            client,
            bot_url: format!("{base}/bot{token}"),
            poll_timeout_seconds: config.poll_timeout_seconds,
        })
    }

    /// Long-poll for updates with `update_id >= offset`.
    ///
    /// Blocks for up to the configured poll timeout when nothing is pending.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let timeout = self.poll_timeout_seconds.to_string();
        let offset_param = offset.to_string();
        let response = self
            .client
            .get(format!("{}/getUpdates", self.bot_url))
            .query(&[("timeout", timeout.as_str()), ("offset", offset_param.as_str())])
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.to_string()))?;

        let body: ApiResponse<Vec<serde_json::Value>> = response
            .json()
            .await
            .map_err(|e| TelegramError::Decode(e.to_string()))?;

        let updates: Vec<Update> = unwrap_api(body)?
            .unwrap_or_default()
            .into_iter()
            .filter_map(decode_update)
            .collect();
        trace!(offset, count = updates.len(), "getUpdates returned");
        Ok(updates)
    }

    /// Deliver `text` to `chat_id`, split into Telegram-sized chunks.
    ///
    /// Stops at the first chunk that fails; earlier chunks stay delivered.
    pub async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<(), TelegramError> {
        for chunk in split_message(text) {
            let response = self
                .client
                .post(format!("{}/sendMessage", self.bot_url))
                .json(&SendMessageRequest { chat_id, text: &chunk })
                .send()
                .await
                .map_err(|e| TelegramError::Http(e.to_string()))?;

            let body: ApiResponse<serde_json::Value> = response
                .json()
                .await
                .map_err(|e| TelegramError::Decode(e.to_string()))?;
            unwrap_api(body)?;
            debug!(%chat_id, len = chunk.chars().count(), "telegram message sent");
        }
        Ok(())
    }
}

fn unwrap_api<T>(body: ApiResponse<T>) -> Result<Option<T>, TelegramError> {
    if body.ok {
        Ok(body.result)
    } else {
        let description = body.description.unwrap_or_else(|| "no description".into());
        warn!(%description, "telegram api returned ok=false");
        Err(TelegramError::Api(description))
    }
}

/// Decode one entry of a `getUpdates` batch on its own, so a single odd
/// update cannot stall the whole batch. An entry that does not fit [`Update`]
/// but still has an `update_id` comes back without a message and is consumed
/// like any other non-message update; one without an id is dropped.
fn decode_update(raw: serde_json::Value) -> Option<Update> {
    let update_id = raw.get("update_id").and_then(serde_json::Value::as_i64);
    match serde_json::from_value::<Update>(raw) {
        Ok(update) => Some(update),
        Err(e) => match update_id {
            Some(update_id) => {
                warn!(update_id, error = %e, "undecodable update, skipping its message");
                Some(Update { update_id, message: None })
            }
            None => {
                warn!(error = %e, "dropping update without update_id");
                None
            }
        },
    }
}

/// Split `text` on char boundaries into chunks of at most
/// [`MAX_MESSAGE_LENGTH`] characters. Empty text becomes a placeholder so
/// the chat always gets a visible reply.
fn split_message(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec!["(empty response)".to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_MESSAGE_LENGTH)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
