//! HTTP implementation of the backend transports

use super::types::{
    ConditionsEnvelope, HistoryEnvelope, ResetRequest, SuccessEnvelope, SymptomsEnvelope,
};
use super::{
    CatalogTransport, ChatReply, ChatRequest, ChatTransport, ConsultationHistoryEntry,
    HealthStatus, HistoryTransport, TransportError,
};
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

/// reqwest-backed client for the diagnostic backend
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.server_url).map_err(|e| {
            TransportError::unknown(format!("Invalid server URL {}: {e}", config.server_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::unknown(format!(
                "Server URL {base_url} cannot carry a path"
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                TransportError::unknown(format!("Server URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn exchange<R: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<R, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            TransportError::invalid_response(format!("Failed to parse response: {e} - body: {body}"))
        })
    }
}

fn classify_status(status: StatusCode, body: &str) -> TransportError {
    match status.as_u16() {
        400..=499 => TransportError::rejected(format!("Request rejected ({status}): {body}")),
        500..=599 => TransportError::server(format!("Server error ({status}): {body}")),
        _ => TransportError::unknown(format!("HTTP {status}: {body}")),
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let url = self.endpoint(&["api", "chat"])?;
        self.exchange(self.client.post(url).json(request)).await
    }

    async fn reset(&self, session_id: &str) -> Result<(), TransportError> {
        let url = self.endpoint(&["api", "reset"])?;
        let _: serde_json::Value = self
            .exchange(self.client.post(url).json(&ResetRequest { session_id }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryTransport for HttpTransport {
    async fn fetch_history(
        &self,
        username: &str,
    ) -> Result<Vec<ConsultationHistoryEntry>, TransportError> {
        let url = self.endpoint(&["api", "history", username])?;
        let envelope: HistoryEnvelope = self.exchange(self.client.get(url)).await?;
        if !envelope.success {
            return Err(TransportError::rejected(format!(
                "History fetch for {username} was not successful"
            )));
        }
        Ok(envelope.history)
    }

    async fn clear_history(&self, username: &str) -> Result<(), TransportError> {
        let url = self.endpoint(&["api", "history", username])?;
        let envelope: SuccessEnvelope = self.exchange(self.client.delete(url)).await?;
        if envelope.success {
            Ok(())
        } else {
            Err(TransportError::rejected(format!(
                "History clear for {username} was not successful"
            )))
        }
    }
}

#[async_trait]
impl CatalogTransport for HttpTransport {
    async fn symptoms(&self) -> Result<Vec<String>, TransportError> {
        let url = self.endpoint(&["api", "symptoms"])?;
        let envelope: SymptomsEnvelope = self.exchange(self.client.get(url)).await?;
        Ok(envelope.symptoms)
    }

    async fn conditions(&self) -> Result<Vec<String>, TransportError> {
        let url = self.endpoint(&["api", "conditions"])?;
        let envelope: ConditionsEnvelope = self.exchange(self.client.get(url)).await?;
        Ok(envelope.conditions)
    }

    async fn health(&self) -> Result<HealthStatus, TransportError> {
        let url = self.endpoint(&["health"])?;
        self.exchange(self.client.get(url)).await
    }
}
