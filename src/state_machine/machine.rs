//! Conversation state holder
//!
//! Owns the message log, suggestion set and busy state for one session and
//! applies the local effects of each transition. Network effects are handed
//! back to the caller.

use super::state::{Message, BOOTSTRAP_GREETING};
use super::transition::{transition, TransitionError};
use super::{ConvContext, ConvState, Effect, Event};
use crate::transport::{ChatReply, ChatRequest, TransportError};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ConversationMachine {
    context: ConvContext,
    state: ConvState,
    log: Vec<Message>,
    suggestions: Vec<String>,
}

impl ConversationMachine {
    /// Create a machine and submit the bootstrap greeting.
    ///
    /// Returns the machine together with the greeting's chat request.
    pub fn start(context: ConvContext, at: DateTime<Utc>) -> (Self, Option<ChatRequest>) {
        let mut machine = Self {
            context,
            state: ConvState::Idle,
            log: Vec::new(),
            suggestions: Vec::new(),
        };
        let request = match machine.submit(BOOTSTRAP_GREETING, at) {
            Ok(request) => Some(request),
            Err(e) => {
                tracing::warn!(error = %e, "Bootstrap greeting rejected");
                None
            }
        };
        (machine, request)
    }

    /// Submit user text. On acceptance returns the request to send.
    pub fn submit(
        &mut self,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<ChatRequest, TransitionError> {
        let event = Event::UserSubmit {
            text: text.to_string(),
            at,
        };
        self.handle(event)?.ok_or_else(|| {
            TransitionError::InvalidTransition("submission produced no chat request".into())
        })
    }

    /// Apply the outcome of the in-flight chat turn
    pub fn receive(
        &mut self,
        outcome: Result<ChatReply, TransportError>,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        let event = Event::from_outcome(outcome, at);
        if let Event::TransportFailed { error, .. } = &event {
            tracing::warn!(
                session_id = %self.context.session_id,
                kind = error.kind.as_str(),
                error = %error,
                "Chat turn failed, showing fallback reply"
            );
        }
        self.handle(event).map(|_| ())
    }

    fn handle(&mut self, event: Event) -> Result<Option<ChatRequest>, TransitionError> {
        let result = transition(&self.state, &self.context, event)?;
        self.state = result.new_state;

        let mut request = None;
        for effect in result.effects {
            match effect {
                Effect::AppendMessage(message) => self.log.push(message),
                Effect::ClearSuggestions => self.suggestions.clear(),
                Effect::ReplaceSuggestions(suggestions) => self.suggestions = suggestions,
                Effect::RequestChat(chat) => request = Some(chat),
            }
        }
        Ok(request)
    }

    pub fn context(&self) -> &ConvContext {
        &self.context
    }

    pub fn session_id(&self) -> &str {
        &self.context.session_id
    }

    #[cfg(test)]
    pub fn state(&self) -> ConvState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn messages(&self) -> &[Message] {
        &self.log
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Quick reply by zero-based position
    pub fn suggestion(&self, index: usize) -> Option<&str> {
        self.suggestions.get(index).map(String::as_str)
    }
}
