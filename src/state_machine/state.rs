//! Conversation state types

use crate::transport::{ChatReply, DiagnosisRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Greeting submitted automatically when a conversation starts
pub const BOOTSTRAP_GREETING: &str = "Hello";

/// Bot reply substituted when a chat turn fails
pub const FALLBACK_REPLY: &str =
    "Sorry, I encountered an error. Please make sure the backend server is running and try again.";

// ============================================================================
// Messages
// ============================================================================

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

/// One entry in the conversation log. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<Vec<DiagnosisRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl Message {
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp,
            diagnosis: None,
            suggestions: None,
        }
    }

    pub fn bot(reply: ChatReply, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: Role::Bot,
            content: reply.text,
            timestamp,
            diagnosis: reply.diagnosis,
            suggestions: reply.suggestions,
        }
    }

    pub fn fallback(timestamp: DateTime<Utc>) -> Self {
        Self {
            role: Role::Bot,
            content: FALLBACK_REPLY.to_string(),
            timestamp,
            diagnosis: None,
            suggestions: None,
        }
    }

    #[cfg(test)]
    pub fn is_bot(&self) -> bool {
        self.role == Role::Bot
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// Conversation state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// Ready for user input
    #[default]
    Idle,

    /// A chat turn is in flight; further submissions are rejected
    Sending,
}

impl ConvState {
    pub fn is_busy(self) -> bool {
        matches!(self, ConvState::Sending)
    }
}

/// Context for a conversation (immutable for its lifetime)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvContext {
    pub session_id: String,
    /// Session generation the conversation belongs to
    pub generation: u64,
}

impl ConvContext {
    pub fn new(session_id: impl Into<String>, generation: u64) -> Self {
        Self {
            session_id: session_id.into(),
            generation,
        }
    }
}
