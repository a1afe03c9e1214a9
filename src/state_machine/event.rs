//! Events that can occur in a conversation

use crate::transport::{ChatReply, TransportError};
use chrono::{DateTime, Utc};

/// Events that trigger state transitions
///
/// Timestamps are carried by the event so that `transition` stays pure.
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserSubmit {
        text: String,
        at: DateTime<Utc>,
    },

    // Transport events
    ReplyReceived {
        reply: ChatReply,
        at: DateTime<Utc>,
    },
    TransportFailed {
        error: TransportError,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn from_outcome(outcome: Result<ChatReply, TransportError>, at: DateTime<Utc>) -> Self {
        match outcome {
            Ok(reply) => Event::ReplyReceived { reply, at },
            Err(error) => Event::TransportFailed { error, at },
        }
    }
}
