//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across arbitrary operation sequences.

use super::state::*;
use super::transition::*;
use super::*;
use crate::transport::{ChatReply, DiagnosisRecord, TransportError};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ConvContext {
    ConvContext::new("session_0_proptest", 7)
}

#[derive(Debug, Clone)]
enum Op {
    Submit(String),
    Reply(ChatReply),
    Fail,
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ,.]{1,30}",
        Just(String::new()),
        "[ \t\n]{1,4}",
    ]
}

fn arb_diagnosis() -> impl Strategy<Value = DiagnosisRecord> {
    ("[A-Z][a-z]{2,10}", 0.0f64..100.0).prop_map(|(condition, confidence)| {
        DiagnosisRecord::new(condition, confidence)
    })
}

fn arb_reply() -> impl Strategy<Value = ChatReply> {
    (
        "[a-zA-Z !?]{1,40}",
        proptest::option::of(proptest::collection::vec(arb_diagnosis(), 0..4)),
        proptest::option::of(proptest::collection::vec("[a-z ]{1,15}", 0..4)),
    )
        .prop_map(|(text, diagnosis, suggestions)| ChatReply {
            text,
            diagnosis,
            suggestions,
            state: None,
        })
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_text().prop_map(Op::Submit),
        arb_reply().prop_map(Op::Reply),
        Just(Op::Fail),
    ]
}

fn run(ops: &[Op]) -> Vec<(ConversationMachine, Option<ChatReply>)> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let (mut machine, _) = ConversationMachine::start(test_context(), base);
    let mut snapshots = Vec::with_capacity(ops.len());

    for (i, op) in ops.iter().enumerate() {
        let at = base + Duration::seconds(i64::try_from(i).unwrap() + 1);
        let mut last_reply = None;
        match op {
            Op::Submit(text) => {
                let _ = machine.submit(text, at);
            }
            Op::Reply(reply) => {
                if machine.receive(Ok(reply.clone()), at).is_ok() {
                    last_reply = Some(reply.clone());
                }
            }
            Op::Fail => {
                let _ = machine.receive(Err(TransportError::network("down")), at);
            }
        }
        snapshots.push((machine.clone(), last_reply));
    }
    snapshots
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Every bot message is preceded by at least as many user messages
    #[test]
    fn prop_log_is_causally_ordered(ops in proptest::collection::vec(arb_op(), 0..40)) {
        for (machine, _) in run(&ops) {
            let mut users = 0usize;
            let mut bots = 0usize;
            for message in machine.messages() {
                match message.role {
                    Role::User => users += 1,
                    Role::Bot => bots += 1,
                }
                prop_assert!(bots <= users, "bot message without a triggering user message");
            }
        }
    }

    /// The log only grows and earlier entries never change
    #[test]
    fn prop_log_is_append_only(ops in proptest::collection::vec(arb_op(), 1..40)) {
        let snapshots = run(&ops);
        for pair in snapshots.windows(2) {
            let before = pair[0].0.messages();
            let after = pair[1].0.messages();
            prop_assert!(after.len() >= before.len());
            prop_assert_eq!(&after[..before.len()], before);
        }
    }

    /// Busy exactly while the last message is an unanswered user message
    #[test]
    fn prop_busy_matches_log_tail(ops in proptest::collection::vec(arb_op(), 0..40)) {
        for (machine, _) in run(&ops) {
            let last_is_user = machine
                .messages()
                .last()
                .is_some_and(|m| m.role == Role::User);
            prop_assert_eq!(machine.is_busy(), last_is_user);
            if machine.is_busy() {
                prop_assert!(machine.suggestions().is_empty());
            }
        }
    }

    /// After a reply, suggestions equal the reply's non-empty list, or are empty
    #[test]
    fn prop_suggestions_follow_latest_reply(ops in proptest::collection::vec(arb_op(), 0..40)) {
        for (machine, reply) in run(&ops) {
            if let Some(reply) = reply {
                let expected = reply.suggestions.unwrap_or_default();
                prop_assert_eq!(machine.suggestions(), expected.as_slice());
            }
        }
    }

    /// Rejected inputs never touch the log
    #[test]
    fn prop_blank_input_rejected(text in "[ \t\n]{0,6}") {
        let result = transition(
            &ConvState::Idle,
            &test_context(),
            Event::UserSubmit { text, at: Utc::now() },
        );
        prop_assert!(matches!(result, Err(TransitionError::EmptyInput)));
    }

    /// transition is deterministic
    #[test]
    fn prop_transition_is_pure(reply in arb_reply()) {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let first = transition(
            &ConvState::Sending,
            &test_context(),
            Event::ReplyReceived { reply: reply.clone(), at },
        ).unwrap();
        let second = transition(
            &ConvState::Sending,
            &test_context(),
            Event::ReplyReceived { reply, at },
        ).unwrap();
        prop_assert_eq!(first.new_state, second.new_state);
        prop_assert_eq!(first.effects, second.effects);
    }
}
