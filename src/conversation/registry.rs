//! Chat id → transcript mapping with lookup-or-create semantics.

use std::collections::HashMap;

use tracing::debug;

use super::{ChatId, Transcript};

/// Owns every live transcript, at most one per [`ChatId`].
///
/// Transcripts are kept in registration order for export; the index map
/// gives direct key lookup into that list.
#[derive(Debug)]
pub struct Registry {
    persona: String,
    transcripts: Vec<Transcript>,
    index: HashMap<ChatId, usize>,
}

impl Registry {
    /// Empty registry. Every transcript it creates opens with `persona`.
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            transcripts: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Record `message` from `chat_id` and return that chat's transcript.
    ///
    /// A first message creates the transcript (persona + message); later
    /// messages are appended as user entries. Never fails.
    pub fn resolve_or_create(&mut self, chat_id: ChatId, message: &str) -> &mut Transcript {
        match self.index.get(&chat_id).copied() {
            Some(slot) => {
                debug!(%chat_id, "appending to existing conversation");
                let transcript = &mut self.transcripts[slot];
                transcript.append_user(message);
                transcript
            }
            None => {
                debug!(%chat_id, "creating conversation");
                let slot = self.transcripts.len();
                self.index.insert(chat_id.clone(), slot);
                self.transcripts.push(Transcript::create(chat_id, message, &self.persona));
                &mut self.transcripts[slot]
            }
        }
    }

    pub fn get(&self, chat_id: &ChatId) -> Option<&Transcript> {
        self.index.get(chat_id).map(|&slot| &self.transcripts[slot])
    }

    /// Every transcript, in the order chats were first seen.
    pub fn all(&self) -> impl Iterator<Item = &Transcript> {
        self.transcripts.iter()
    }

    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }
}
