//! Backend transport abstraction
//!
//! Typed request/response bindings to the diagnostic backend. Each call is a
//! single exchange: no retries happen at this layer.

pub(crate) mod error;
mod http;
mod types;

#[cfg(test)]
pub mod testing;

pub use error::TransportError;
pub use http::HttpTransport;
pub use types::*;

use async_trait::async_trait;
use std::time::Instant;

/// Chat turn exchange
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one user message and wait for the bot reply
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError>;

    /// Tell the backend a session id has been abandoned
    async fn reset(&self, session_id: &str) -> Result<(), TransportError>;
}

/// Consultation history storage, scoped by username
#[async_trait]
pub trait HistoryTransport: Send + Sync {
    /// Fetch every entry for `username`, chronological ascending
    async fn fetch_history(
        &self,
        username: &str,
    ) -> Result<Vec<ConsultationHistoryEntry>, TransportError>;

    /// Delete every entry for `username`
    async fn clear_history(&self, username: &str) -> Result<(), TransportError>;
}

/// Read-only reference data exposed by the backend
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn symptoms(&self) -> Result<Vec<String>, TransportError>;

    async fn conditions(&self) -> Result<Vec<String>, TransportError>;

    async fn health(&self) -> Result<HealthStatus, TransportError>;
}

/// Logging wrapper for transports
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    #[allow(dead_code)] // Accessor for callers that need the raw client
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

fn log_outcome<R>(operation: &str, start: Instant, result: &Result<R, TransportError>) {
    let duration = start.elapsed();
    match result {
        Ok(_) => {
            tracing::info!(
                operation,
                duration_ms = %duration.as_millis(),
                "Backend request completed"
            );
        }
        Err(e) => {
            tracing::error!(
                operation,
                duration_ms = %duration.as_millis(),
                error = %e.message,
                kind = e.kind.as_str(),
                "Backend request failed"
            );
        }
    }
}

#[async_trait]
impl<T: ChatTransport> ChatTransport for LoggingTransport<T> {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let start = Instant::now();
        let result = self.inner.send(request).await;
        log_outcome("chat", start, &result);
        if let Ok(reply) = &result {
            tracing::debug!(
                session_id = %request.session_id,
                backend_state = reply.state.as_deref().unwrap_or("-"),
                diagnoses = reply.diagnosis.as_ref().map_or(0, Vec::len),
                "Chat reply received"
            );
        }
        result
    }

    async fn reset(&self, session_id: &str) -> Result<(), TransportError> {
        let start = Instant::now();
        let result = self.inner.reset(session_id).await;
        log_outcome("reset", start, &result);
        result
    }
}

#[async_trait]
impl<T: HistoryTransport> HistoryTransport for LoggingTransport<T> {
    async fn fetch_history(
        &self,
        username: &str,
    ) -> Result<Vec<ConsultationHistoryEntry>, TransportError> {
        let start = Instant::now();
        let result = self.inner.fetch_history(username).await;
        log_outcome("fetch_history", start, &result);
        result
    }

    async fn clear_history(&self, username: &str) -> Result<(), TransportError> {
        let start = Instant::now();
        let result = self.inner.clear_history(username).await;
        log_outcome("clear_history", start, &result);
        result
    }
}

#[async_trait]
impl<T: CatalogTransport> CatalogTransport for LoggingTransport<T> {
    async fn symptoms(&self) -> Result<Vec<String>, TransportError> {
        let start = Instant::now();
        let result = self.inner.symptoms().await;
        log_outcome("symptoms", start, &result);
        result
    }

    async fn conditions(&self) -> Result<Vec<String>, TransportError> {
        let start = Instant::now();
        let result = self.inner.conditions().await;
        log_outcome("conditions", start, &result);
        result
    }

    async fn health(&self) -> Result<HealthStatus, TransportError> {
        let start = Instant::now();
        let result = self.inner.health().await;
        log_outcome("health", start, &result);
        result
    }
}
