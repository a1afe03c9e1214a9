//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
mod machine;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use machine::ConversationMachine;
pub use state::{ConvContext, ConvState, Message, Role};
pub use transition::TransitionError;
