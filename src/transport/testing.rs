//! Mock transports for testing
//!
//! These mocks enable controller tests without a running backend.

use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

type Scripted<T> = (Duration, Result<T, TransportError>);

// ============================================================================
// Mock Chat Transport
// ============================================================================

/// Mock chat transport that returns queued replies in order
#[derive(Default)]
pub struct MockChatTransport {
    replies: Mutex<VecDeque<Scripted<ChatReply>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ChatRequest>>,
    /// Session ids passed to `reset`
    pub resets: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockChatTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, reply: ChatReply) {
        self.queue_reply_after(reply, Duration::ZERO);
    }

    /// Queue a reply delivered after `delay`
    pub fn queue_reply_after(&self, reply: ChatReply, delay: Duration) {
        self.replies.lock().unwrap().push_back((delay, Ok(reply)));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: TransportError) {
        self.replies
            .lock()
            .unwrap()
            .push_back((Duration::ZERO, Err(error)));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn recorded_resets(&self) -> Vec<String> {
        self.resets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for MockChatTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let scripted = self.replies.lock().unwrap().pop_front();
        match scripted {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Err(TransportError::network("No mock reply queued")),
        }
    }

    async fn reset(&self, session_id: &str) -> Result<(), TransportError> {
        self.resets.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}

// ============================================================================
// Mock History Transport
// ============================================================================

/// Mock history transport with scripted fetch and clear results
#[derive(Default)]
pub struct MockHistoryTransport {
    fetches: Mutex<VecDeque<Scripted<Vec<ConsultationHistoryEntry>>>>,
    clears: Mutex<VecDeque<Scripted<()>>>,
    /// Usernames passed to `clear_history`
    pub clear_calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockHistoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_history(&self, entries: Vec<ConsultationHistoryEntry>) {
        self.queue_history_after(entries, Duration::ZERO);
    }

    pub fn queue_history_after(&self, entries: Vec<ConsultationHistoryEntry>, delay: Duration) {
        self.fetches.lock().unwrap().push_back((delay, Ok(entries)));
    }

    pub fn queue_fetch_error(&self, error: TransportError) {
        self.fetches
            .lock()
            .unwrap()
            .push_back((Duration::ZERO, Err(error)));
    }

    pub fn queue_clear(&self, result: Result<(), TransportError>) {
        self.clears
            .lock()
            .unwrap()
            .push_back((Duration::ZERO, result));
    }

    pub fn clear_call_count(&self) -> usize {
        self.clear_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HistoryTransport for MockHistoryTransport {
    async fn fetch_history(
        &self,
        _username: &str,
    ) -> Result<Vec<ConsultationHistoryEntry>, TransportError> {
        let scripted = self.fetches.lock().unwrap().pop_front();
        match scripted {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Err(TransportError::network("No mock history queued")),
        }
    }

    async fn clear_history(&self, username: &str) -> Result<(), TransportError> {
        self.clear_calls.lock().unwrap().push(username.to_string());
        let scripted = self.clears.lock().unwrap().pop_front();
        match scripted {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Ok(()),
        }
    }
}

/// Build a history entry with the given symptoms and no diagnoses
pub fn entry(timestamp: &str, symptoms: &[&str]) -> ConsultationHistoryEntry {
    ConsultationHistoryEntry {
        timestamp: timestamp.to_string(),
        symptoms: symptoms.iter().map(|s| (*s).to_string()).collect(),
        diagnoses: Vec::new(),
        session_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_chat_transport() {
        let mock = MockChatTransport::new();
        mock.queue_reply(ChatReply::text("Hello"));

        let request = ChatRequest {
            session_id: "s1".to_string(),
            message: "Hi".to_string(),
        };
        let reply = mock.send(&request).await.unwrap();
        assert_eq!(reply.text, "Hello");

        // Second call should fail (no more replies)
        assert!(mock.send(&request).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_history_transport() {
        let mock = MockHistoryTransport::new();
        mock.queue_history(vec![entry("2024-01-01T00:00:00", &["fever"])]);

        assert_eq!(mock.fetch_history("ann").await.unwrap().len(), 1);
        assert!(mock.fetch_history("ann").await.is_err());

        assert!(mock.clear_history("ann").await.is_ok());
        assert_eq!(mock.clear_call_count(), 1);
    }
}
