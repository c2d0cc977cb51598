pub mod exchange;
pub mod message;
pub mod session;

pub use exchange::ExchangeRecord;
pub use message::{ChatMessage, Role};
pub use session::ConversationSession;
