//! Relay loop: poll Telegram, run one turn per message, reply.
//!
//! Every update goes `received → resolved → generated → relayed`, strictly
//! one at a time:
//!
//! 1. the poll offset moves past the update before anything else, so a turn
//!    that fails halfway is never re-delivered;
//! 2. the chat's transcript is resolved (or created) with the user text;
//! 3. the full transcript is sent to the LLM; a reply is appended as an
//!    assistant entry, a failure is logged by kind and replaced with the
//!    fallback reply, which is *not* appended;
//! 4. the reply is sent back to the chat; delivery failures are logged only;
//! 5. if the user text is exactly the export trigger, all transcripts are
//!    exported.
//!
//! A poll that returns nothing (or fails) is followed by one fixed pause.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::conversation::{ChatId, Registry};
use crate::export;
use crate::llm::{FailureKind, LlmProvider};
use crate::telegram::{TelegramClient, Update};

/// Result of a single [`Relay::poll_once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The poll returned no updates.
    Idle,
    /// The poll itself failed; the offset is unchanged.
    Failed,
    /// `consumed` updates were taken off the queue, `turns` of them were
    /// text messages that ran a full turn.
    Processed { consumed: usize, turns: usize },
}

/// What happened to one text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub chat_id: ChatId,
    /// Text sent back to the chat: the completion, or the fallback reply.
    pub reply: String,
    /// Set when the completion failed and the fallback was used.
    pub failure: Option<FailureKind>,
    /// Whether Telegram accepted the reply.
    pub relayed: bool,
    /// Whether this turn wrote an export file.
    pub exported: bool,
}

/// Counters reported when [`Relay::run`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub polls: u64,
    pub turns: u64,
    pub idle_pauses: u64,
}

/// Owns the conversation registry and the poll offset; borrows nothing.
pub struct Relay {
    telegram: TelegramClient,
    llm: LlmProvider,
    registry: Registry,
    config: RelayConfig,
    offset: i64,
}

impl Relay {
    pub fn new(telegram: TelegramClient, llm: LlmProvider, config: RelayConfig) -> Self {
        Self {
            telegram,
            llm,
            registry: Registry::new(config.persona.clone()),
            config,
            offset: 0,
        }
    }

    /// Next `update_id` to ask Telegram for.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Poll until `shutdown` is cancelled.
    ///
    /// The long poll and the idle pause both race the token, so shutdown does
    /// not wait out a 100-second poll.
    pub async fn run(&mut self, shutdown: CancellationToken) -> RelayStats {
        let mut stats = RelayStats::default();
        info!(offset = self.offset, "relay loop starting");

        loop {
            let outcome = tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,
                outcome = self.poll_once() => outcome,
            };
            stats.polls += 1;

            match outcome {
                PollOutcome::Processed { turns, .. } => stats.turns += turns as u64,
                PollOutcome::Idle | PollOutcome::Failed => {
                    tokio::select! {
                        biased;

                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.idle_pause) => stats.idle_pauses += 1,
                    }
                }
            }
        }

        info!(
            polls = stats.polls,
            turns = stats.turns,
            conversations = self.registry.len(),
            "relay loop stopped"
        );
        stats
    }

    /// One poll plus processing of the whole batch. Never pauses.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let updates = match self.telegram.get_updates(self.offset).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(offset = self.offset, error = %e, "telegram poll failed");
                return PollOutcome::Failed;
            }
        };

        if updates.is_empty() {
            return PollOutcome::Idle;
        }

        let consumed = updates.len();
        let mut turns = 0;
        for update in updates {
            if self.handle_update(update).await.is_some() {
                turns += 1;
            }
        }
        PollOutcome::Processed { consumed, turns }
    }

    /// Consume one update. Returns `None` for updates that carry no text
    /// message; those still advance the offset.
    pub async fn handle_update(&mut self, update: Update) -> Option<TurnReport> {
        self.offset = update.update_id + 1;

        let Some(message) = update.message else {
            debug!(update_id = update.update_id, "skipping update without message");
            return None;
        };
        let Some(text) = message.text else {
            debug!(update_id = update.update_id, chat_id = %message.chat.id, "skipping non-text message");
            return None;
        };

        info!(update_id = update.update_id, chat_id = %message.chat.id, "received message");
        Some(self.run_turn(message.chat.id, text).await)
    }

    async fn run_turn(&mut self, chat_id: ChatId, text: String) -> TurnReport {
        let transcript = self.registry.resolve_or_create(chat_id.clone(), &text);

        let (reply, failure) = match self.llm.complete(transcript.snapshot()).await {
            Ok(reply) => {
                transcript.append_assistant(reply.clone());
                (reply, None)
            }
            Err(e) => {
                let kind = e.kind();
                match kind {
                    FailureKind::Request => {
                        warn!(%chat_id, %kind, error = %e, "completion API returned an error")
                    }
                    FailureKind::Connection => {
                        warn!(%chat_id, %kind, error = %e, "could not connect to completion API")
                    }
                    FailureKind::RateLimit => {
                        warn!(%chat_id, %kind, error = %e, "completion API rate limit exceeded")
                    }
                }
                (self.config.fallback_reply.clone(), Some(kind))
            }
        };

        let relayed = match self.telegram.send_message(&chat_id, &reply).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%chat_id, error = %e, "failed to relay reply");
                false
            }
        };

        let exported = text == self.config.export_trigger && self.export();

        TurnReport { chat_id, reply, failure, relayed, exported }
    }

    fn export(&self) -> bool {
        match export::export_all(&self.registry, &self.config.export_path) {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "conversation export failed");
                false
            }
        }
    }
}
