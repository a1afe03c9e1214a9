//! Effects produced by state transitions

use super::state::Message;
use crate::transport::ChatRequest;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a message to the conversation log
    AppendMessage(Message),

    /// Drop the current quick-reply suggestions
    ClearSuggestions,

    /// Replace the quick-reply suggestions wholesale
    ReplaceSuggestions(Vec<String>),

    /// Send a chat turn to the backend
    RequestChat(ChatRequest),
}

impl Effect {
    pub fn append(message: Message) -> Self {
        Effect::AppendMessage(message)
    }

    pub fn request_chat(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Effect::RequestChat(ChatRequest {
            session_id: session_id.into(),
            message: message.into(),
        })
    }
}
