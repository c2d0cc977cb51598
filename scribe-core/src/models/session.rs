use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::message::ChatMessage;

/// One logical conversation: an identity plus the history sent back to the assistant.
///
/// Sessions are replaced, never mutated into a new identity. Dropping a session
/// drops its history with it, so a fresh session never carries prior context.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    history: Vec<ChatMessage>,
}

impl ConversationSession {
    pub fn start() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Append a completed prompt/response pair to the history.
    pub fn record_exchange(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.history.push(ChatMessage::user(prompt));
        self.history.push(ChatMessage::assistant(response));
    }
}
