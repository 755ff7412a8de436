//! Session state: the active session, its transcript and the last query.

pub mod context;
pub mod model;
pub mod store;

pub use context::QueryContext;
pub use model::{Affordance, ChatTurn, MessageRole, Session, TokenUsage};
pub use store::{ChatContext, Notice, TypingIndicator};
