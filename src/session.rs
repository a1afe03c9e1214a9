//! Session lifecycle and chat turn dispatch
//!
//! The controller owns the active session and its conversation. Chat turns
//! run as spawned tasks and report back over a channel; each outcome carries
//! the generation of the session that sent it so late replies from an
//! abandoned session are dropped instead of landing in the new log.

use crate::auth::AuthenticatedUser;
use crate::state_machine::{ConvContext, ConversationMachine, TransitionError};
use crate::transport::{ChatReply, ChatRequest, ChatTransport, TransportError};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

const SESSION_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque backend session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Mint `session_<unix-millis>_<9 random base-36 chars>`
    pub fn generate(now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SESSION_SUFFIX_LEN)
            .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
            .collect();
        Self(format!("session_{}_{suffix}", now.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The active session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
}

/// Result of one spawned chat turn
#[derive(Debug)]
pub struct TurnOutcome {
    pub(crate) generation: u64,
    pub(crate) session_id: String,
    pub(crate) result: Result<ChatReply, TransportError>,
}

pub struct SessionController<T: ChatTransport + 'static> {
    transport: Arc<T>,
    user: Option<AuthenticatedUser>,
    session: Option<Session>,
    conversation: Option<ConversationMachine>,
    generation: u64,
    outcome_tx: mpsc::Sender<TurnOutcome>,
    outcome_rx: mpsc::Receiver<TurnOutcome>,
}

impl<T: ChatTransport + 'static> SessionController<T> {
    pub fn new(transport: Arc<T>) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel(32);
        Self {
            transport,
            user: None,
            session: None,
            conversation: None,
            generation: 0,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Start a fresh session for `user` and send the bootstrap greeting
    pub fn start_session(&mut self, user: &AuthenticatedUser) -> SessionId {
        self.user = Some(user.clone());
        self.begin(None)
    }

    /// Abandon the current session and start a new one.
    ///
    /// Returns `None` when no session has been started. The backend is told
    /// about the abandoned id in the background; failures are only logged.
    pub fn reset_session(&mut self) -> Option<SessionId> {
        self.user.as_ref()?;
        let previous = self.session.take().map(|session| session.id);

        if let Some(old) = previous.clone() {
            let transport = Arc::clone(&self.transport);
            tokio::spawn(async move {
                if let Err(e) = transport.reset(old.as_str()).await {
                    tracing::warn!(session_id = %old, error = %e, "Backend session reset failed");
                }
            });
        }

        Some(self.begin(previous.as_ref()))
    }

    fn begin(&mut self, previous: Option<&SessionId>) -> SessionId {
        self.generation += 1;
        let now = Utc::now();

        let mut id = SessionId::generate(now);
        while previous == Some(&id) {
            id = SessionId::generate(now);
        }

        let context = ConvContext::new(id.as_str(), self.generation);
        let (machine, greeting) = ConversationMachine::start(context, now);
        self.conversation = Some(machine);
        self.session = Some(Session {
            id: id.clone(),
            created_at: now,
        });

        tracing::info!(session_id = %id, generation = self.generation, "Session started");
        if let Some(request) = greeting {
            self.spawn_turn(request);
        }
        id
    }

    /// Submit user text to the active conversation.
    ///
    /// Rejected input leaves the log unchanged and sends nothing.
    pub fn submit(&mut self, text: &str) -> Result<(), TransitionError> {
        let machine = self
            .conversation
            .as_mut()
            .ok_or_else(|| TransitionError::InvalidTransition("no active session".into()))?;
        let request = machine.submit(text, Utc::now())?;
        self.spawn_turn(request);
        Ok(())
    }

    /// Submit the quick reply at zero-based `index`
    pub fn submit_suggestion(&mut self, index: usize) -> Option<Result<(), TransitionError>> {
        let text = self.conversation.as_ref()?.suggestion(index)?.to_string();
        Some(self.submit(&text))
    }

    fn spawn_turn(&self, request: ChatRequest) {
        let transport = Arc::clone(&self.transport);
        let outcome_tx = self.outcome_tx.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            let result = transport.send(&request).await;
            let outcome = TurnOutcome {
                generation,
                session_id: request.session_id,
                result,
            };
            if outcome_tx.send(outcome).await.is_err() {
                tracing::debug!(generation, "Controller dropped before chat turn completed");
            }
        });
    }

    /// Apply a finished turn. Returns false when the outcome was discarded.
    pub fn apply_outcome(&mut self, outcome: TurnOutcome) -> bool {
        let current = self.conversation.as_mut().filter(|machine| {
            machine.context().generation == outcome.generation
                && machine.session_id() == outcome.session_id
        });
        let Some(machine) = current else {
            tracing::debug!(
                session_id = %outcome.session_id,
                generation = outcome.generation,
                "Discarding chat outcome from abandoned session"
            );
            return false;
        };

        match machine.receive(outcome.result, Utc::now()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Chat outcome rejected");
                false
            }
        }
    }

    /// Wait for the next finished turn (current or stale)
    pub async fn next_outcome(&mut self) -> Option<TurnOutcome> {
        self.outcome_rx.recv().await
    }

    /// Wait until the active conversation has no turn in flight
    #[cfg(test)]
    pub async fn settle(&mut self) {
        while self.is_busy() {
            let Some(outcome) = self.next_outcome().await else {
                break;
            };
            self.apply_outcome(outcome);
        }
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.conversation
            .as_ref()
            .is_some_and(ConversationMachine::is_busy)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn conversation(&self) -> Option<&ConversationMachine> {
        self.conversation.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::state_machine::state::FALLBACK_REPLY;
    use crate::state_machine::Role;
    use crate::transport::testing::MockChatTransport;
    use crate::transport::DiagnosisRecord;
    use std::time::Duration;

    fn user() -> AuthenticatedUser {
        Identity {
            username: "ann".to_string(),
            is_authenticated: true,
        }
        .authenticated()
        .unwrap()
    }

    fn controller() -> (SessionController<MockChatTransport>, Arc<MockChatTransport>) {
        let transport = Arc::new(MockChatTransport::new());
        (SessionController::new(Arc::clone(&transport)), transport)
    }

    fn log(controller: &SessionController<MockChatTransport>) -> Vec<(Role, String)> {
        controller
            .conversation()
            .unwrap()
            .messages()
            .iter()
            .map(|m| (m.role, m.content.clone()))
            .collect()
    }

    #[test]
    fn test_session_id_format() {
        let now = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let id = SessionId::generate(now);
        let rest = id.as_str().strip_prefix("session_1700000000123_").unwrap();
        assert_eq!(rest.len(), 9);
        assert!(rest.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn test_bootstrap_greeting() {
        let (mut controller, transport) = controller();
        transport.queue_reply(ChatReply::text("Hello! How can I help?"));

        let id = controller.start_session(&user());
        assert!(controller.is_busy());
        controller.settle().await;

        assert_eq!(
            log(&controller),
            vec![
                (Role::User, "Hello".to_string()),
                (Role::Bot, "Hello! How can I help?".to_string()),
            ]
        );
        let requests = transport.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].session_id, id.as_str());
        assert_eq!(requests[0].message, "Hello");
    }

    #[tokio::test]
    async fn test_diagnosis_turn() {
        let (mut controller, transport) = controller();
        transport.queue_reply(ChatReply::text("Hi"));
        controller.start_session(&user());
        controller.settle().await;

        transport.queue_reply(
            ChatReply::text("Based on your symptoms:")
                .with_diagnosis(vec![
                    DiagnosisRecord::new("Flu", 80.5).with_matched(["fever", "cough"]),
                    DiagnosisRecord::new("Cold", 42.0).with_matched(["cough"]),
                ])
                .with_suggestions(["Tell me more"]),
        );
        controller.submit("I have fever and cough").unwrap();
        controller.settle().await;

        let conversation = controller.conversation().unwrap();
        let last = conversation.messages().last().unwrap();
        assert!(last.is_bot());
        let diagnosis = last.diagnosis.as_ref().unwrap();
        assert_eq!(diagnosis[0].condition, "Flu");
        assert_eq!(diagnosis[1].condition, "Cold");
        assert_eq!(conversation.suggestions(), ["Tell me more"]);
    }

    #[tokio::test]
    async fn test_transport_failure_uses_fallback() {
        let (mut controller, transport) = controller();
        transport.queue_reply(ChatReply::text("Hi"));
        controller.start_session(&user());
        controller.settle().await;

        transport.queue_error(TransportError::network("connection refused"));
        controller.submit("headache").unwrap();
        controller.settle().await;

        let messages = log(&controller);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[3], (Role::Bot, FALLBACK_REPLY.to_string()));
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn test_submit_while_busy_is_rejected() {
        let (mut controller, transport) = controller();
        transport.queue_reply_after(ChatReply::text("Hi"), Duration::from_millis(20));
        controller.start_session(&user());

        assert_eq!(controller.submit("again"), Err(TransitionError::Busy));
        assert_eq!(controller.submit("   "), Err(TransitionError::EmptyInput));
        controller.settle().await;
        assert_eq!(controller.submit("  "), Err(TransitionError::EmptyInput));
        assert_eq!(log(&controller).len(), 2);
    }

    #[tokio::test]
    async fn test_submit_without_session() {
        let (mut controller, _) = controller();
        assert!(matches!(
            controller.submit("hi"),
            Err(TransitionError::InvalidTransition(_))
        ));
        assert!(controller.reset_session().is_none());
    }

    #[tokio::test]
    async fn test_suggestion_submission() {
        let (mut controller, transport) = controller();
        transport.queue_reply(ChatReply::text("Hi").with_suggestions(["I have a fever"]));
        controller.start_session(&user());
        controller.settle().await;

        transport.queue_reply(ChatReply::text("How long?"));
        assert!(controller.submit_suggestion(3).is_none());
        controller.submit_suggestion(0).unwrap().unwrap();
        controller.settle().await;

        let requests = transport.recorded_requests();
        assert_eq!(requests[1].message, "I have a fever");
    }

    #[tokio::test]
    async fn test_reset_starts_fresh_conversation() {
        let (mut controller, transport) = controller();
        transport.queue_reply(ChatReply::text("Hi"));
        let first = controller.start_session(&user());
        controller.settle().await;

        transport.queue_reply(ChatReply::text("Hi again"));
        let second = controller.reset_session().unwrap();
        assert_ne!(first, second);
        controller.settle().await;

        assert_eq!(
            log(&controller),
            vec![
                (Role::User, "Hello".to_string()),
                (Role::Bot, "Hi again".to_string()),
            ]
        );
        assert_eq!(controller.session().unwrap().id, second);
        assert_eq!(transport.recorded_resets(), vec![first.as_str().to_string()]);
    }

    #[tokio::test]
    async fn test_stale_outcome_is_discarded() {
        let (mut controller, _) = controller();
        let first = controller.start_session(&user());
        let stale_generation = controller.conversation().unwrap().context().generation;
        controller.reset_session().unwrap();

        let applied = controller.apply_outcome(TurnOutcome {
            generation: stale_generation,
            session_id: first.as_str().to_string(),
            result: Ok(ChatReply::text("late reply")),
        });
        assert!(!applied);
        assert_eq!(log(&controller), vec![(Role::User, "Hello".to_string())]);
    }

    #[tokio::test]
    async fn test_late_reply_after_reset_does_not_leak() {
        let (mut controller, transport) = controller();
        transport.queue_reply_after(ChatReply::text("old session reply"), Duration::from_millis(50));
        controller.start_session(&user());
        tokio::task::yield_now().await;

        transport.queue_reply(ChatReply::text("new session reply"));
        controller.reset_session().unwrap();
        controller.settle().await;

        // The abandoned turn still completes; it must not be applied
        let late = controller.next_outcome().await.unwrap();
        assert!(!controller.apply_outcome(late));
        assert_eq!(
            log(&controller),
            vec![
                (Role::User, "Hello".to_string()),
                (Role::Bot, "new session reply".to_string()),
            ]
        );
    }
}
