//! Ordered message history of a single chat.

use super::{ChatId, Message};

/// Append-only message history for one chat.
///
/// The first entry is always the persona system message supplied at
/// creation. No method removes, reorders or edits entries.
#[derive(Debug, Clone)]
pub struct Transcript {
    chat_id: ChatId,
    messages: Vec<Message>,
}

impl Transcript {
    /// Start a transcript with the persona followed by the first user message.
    ///
    /// `first_user_message` is stored as-is, empty text included.
    pub fn create(chat_id: ChatId, first_user_message: impl Into<String>, persona: &str) -> Self {
        Self {
            chat_id,
            messages: vec![Message::system(persona), Message::user(first_user_message)],
        }
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    pub fn append_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn append_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Full history in order. Sent verbatim as the prompt context.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true: a transcript always holds at least the persona and the
    /// first user message.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    const PERSONA: &str = "You are a test assistant.";

    #[test]
    fn create_seeds_system_then_user() {
        let t = Transcript::create(ChatId::Int(7), "hello", PERSONA);
        assert_eq!(t.chat_id(), &ChatId::Int(7));
        assert_eq!(t.snapshot(), &[Message::system(PERSONA), Message::user("hello")]);
    }

    #[test]
    fn create_accepts_empty_first_message() {
        let t = Transcript::create(ChatId::Int(7), "", PERSONA);
        assert_eq!(t.len(), 2);
        assert_eq!(t.snapshot()[1].content, "");
    }

    #[test]
    fn appends_preserve_order() {
        let mut t = Transcript::create(ChatId::Int(1), "q0", PERSONA);
        for i in 1..=5 {
            t.append_assistant(format!("a{}", i - 1));
            t.append_user(format!("q{i}"));
        }
        let before: Vec<Message> = t.snapshot().to_vec();
        t.append_user("extra");

        assert_eq!(t.len(), before.len() + 1);
        assert_eq!(&t.snapshot()[..before.len()], before.as_slice());
        assert_eq!(t.snapshot().last(), Some(&Message::user("extra")));
    }

    #[test]
    fn consecutive_user_messages_allowed() {
        let mut t = Transcript::create(ChatId::Int(1), "first", PERSONA);
        t.append_user("second");
        t.append_user("third");
        let roles: Vec<Role> = t.snapshot().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::User, Role::User]);
    }

    #[test]
    fn system_message_only_at_head() {
        let mut t = Transcript::create(ChatId::Int(1), "hi", PERSONA);
        t.append_assistant("hello");
        t.append_user("again");
        let systems = t.snapshot().iter().filter(|m| m.role == Role::System).count();
        assert_eq!(systems, 1);
        assert_eq!(t.snapshot()[0], Message::system(PERSONA));
    }
}
