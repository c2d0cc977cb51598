//! Chat orchestrator: session lifecycle plus the audit side effect
//!
//! Wraps an `AssistantBackend` by composition. Every exchange runs:
//! ensure session → backend → history → audit log → return.
//! Only the backend can fail a `chat` call; the audit outcome is discarded.

use std::sync::Arc;

use scribe_core::{
    AssistantBackend, AssistantError, AuditLogger, ChatMessage, ConversationSession,
};
use uuid::Uuid;

pub struct ChatOrchestrator {
    backend: Arc<dyn AssistantBackend>,
    audit: AuditLogger,
    session: Option<ConversationSession>,
}

impl ChatOrchestrator {
    pub fn new(backend: Arc<dyn AssistantBackend>, audit: AuditLogger) -> Self {
        Self {
            backend,
            audit,
            session: None,
        }
    }

    /// Replace the active session with a fresh one, discarding its history.
    pub fn start_new_conversation(&mut self) -> Uuid {
        let session = fresh_session();
        let id = session.id();
        self.session = Some(session);
        id
    }

    /// Id of the active session, if one has been started.
    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(ConversationSession::id)
    }

    pub fn history(&self) -> &[ChatMessage] {
        self.session
            .as_ref()
            .map(ConversationSession::history)
            .unwrap_or_default()
    }

    /// Send `prompt` to the assistant and log the exchange.
    ///
    /// Starts a session on first use. The prompt is passed through unchanged,
    /// blank or not. Backend errors propagate as-is and nothing is logged for
    /// them; audit failures never reach the caller.
    pub async fn chat(&mut self, prompt: &str) -> Result<String, AssistantError> {
        let session = self.session.get_or_insert_with(fresh_session);

        let response = self.backend.respond(prompt, session.history()).await?;
        session.record_exchange(prompt, response.clone());
        let session_id = session.id();

        // Delivery is best effort; the outcome only feeds diagnostics.
        let outcome = self.audit.log(prompt, &response, session_id).await;
        tracing::debug!(
            conversation_id = %session_id,
            chat_id = %outcome.chat_id(),
            delivered = outcome.is_delivered(),
            "Exchange complete"
        );

        Ok(response)
    }
}

fn fresh_session() -> ConversationSession {
    let session = ConversationSession::start();
    tracing::info!(
        conversation_id = %session.id(),
        created_at = %session.created_at(),
        "Started new conversation"
    );
    session
}
