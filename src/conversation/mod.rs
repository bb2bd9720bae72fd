//! In-memory conversation state.
//!
//! A [`Transcript`] is the ordered history of one chat, seeded with the
//! persona system message. The [`Registry`] maps each [`ChatId`] to exactly
//! one transcript and is owned by the relay loop; nothing else holds it.

pub mod registry;
pub mod transcript;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use registry::Registry;
pub use transcript::Transcript;

// ── ChatId ───────────────────────────────────────────────────────────────────

/// Opaque chat identifier as received from the messaging platform.
///
/// Telegram sends integers, other platforms may send strings. The value is
/// compared by exact equality and serialised back unchanged, so `42` and
/// `"42"` are two different chats.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Int(i64),
    Str(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Int(i) => write!(f, "{i}"),
            ChatId::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ChatId {
    fn from(v: i64) -> Self { ChatId::Int(v) }
}
impl From<String> for ChatId {
    fn from(v: String) -> Self { ChatId::Str(v) }
}
impl From<&str> for ChatId {
    fn from(v: &str) -> Self { ChatId::Str(v.to_string()) }
}

// ── Message ──────────────────────────────────────────────────────────────────

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged transcript entry. Serialises to the chat-completions
/// message shape `{"role": "...", "content": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_id_keeps_wire_type() {
        assert_eq!(serde_json::to_string(&ChatId::Int(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&ChatId::from("abc")).unwrap(), "\"abc\"");

        let parsed: ChatId = serde_json::from_str("-1001234").unwrap();
        assert_eq!(parsed, ChatId::Int(-1001234));
        let parsed: ChatId = serde_json::from_str("\"@channel\"").unwrap();
        assert_eq!(parsed, ChatId::Str("@channel".into()));
    }

    #[test]
    fn chat_id_no_normalisation() {
        assert_ne!(ChatId::Int(42), ChatId::from("42"));
        assert_ne!(ChatId::from("Alice"), ChatId::from("alice"));
    }

    #[test]
    fn message_serialises_lowercase_role() {
        let json = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "assistant", "content": "hi" }));
    }
}
