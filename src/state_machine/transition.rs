//! Pure state transition function

use super::state::Message;
use super::{ConvContext, ConvState, Effect, Event};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("A message is already being sent")]
    Busy,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Rejected user input is silently ignored by the UI
    pub fn is_input_rejection(&self) -> bool {
        matches!(self, TransitionError::EmptyInput | TransitionError::Busy)
    }
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // User submissions
        // ============================================================
        (_, Event::UserSubmit { text, .. }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyInput)
        }

        // Idle + UserSubmit -> Sending (user message is appended before the reply)
        (ConvState::Idle, Event::UserSubmit { text, at }) => {
            Ok(TransitionResult::new(ConvState::Sending)
                .with_effect(Effect::append(Message::user(text.clone(), at)))
                .with_effect(Effect::ClearSuggestions)
                .with_effect(Effect::request_chat(context.session_id.clone(), text)))
        }

        (ConvState::Sending, Event::UserSubmit { .. }) => Err(TransitionError::Busy),

        // ============================================================
        // Transport outcomes
        // ============================================================
        (ConvState::Sending, Event::ReplyReceived { reply, at }) => {
            let suggestions = reply
                .suggestions
                .clone()
                .filter(|suggestions| !suggestions.is_empty());

            let result = TransitionResult::new(ConvState::Idle)
                .with_effect(Effect::append(Message::bot(reply, at)));

            Ok(match suggestions {
                Some(suggestions) => result.with_effect(Effect::ReplaceSuggestions(suggestions)),
                None => result,
            })
        }

        // Any failure is recovered locally; no retry
        (ConvState::Sending, Event::TransportFailed { at, .. }) => {
            Ok(TransitionResult::new(ConvState::Idle)
                .with_effect(Effect::append(Message::fallback(at))))
        }

        (ConvState::Idle, Event::ReplyReceived { .. } | Event::TransportFailed { .. }) => Err(
            TransitionError::InvalidTransition("chat outcome arrived with no turn in flight".into()),
        ),
    }
}
