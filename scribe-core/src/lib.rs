pub mod assistant;
pub mod audit;
pub mod config;
pub mod error;
pub mod models;

pub use assistant::{AssistantBackend, AssistantError, HttpAssistant};
pub use audit::{AuditError, AuditLogger, AuditSink, LogOutcome, TableClient};
pub use config::{AssistantConfig, AuditConfig, ScribeConfig, ServiceConfig};
pub use error::ScribeError;
pub use models::{ChatMessage, ConversationSession, ExchangeRecord, Role};
