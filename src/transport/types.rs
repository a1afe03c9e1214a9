//! Types exchanged with the diagnostic backend

use serde::{Deserialize, Deserializer, Serialize};

/// One ranked candidate condition as produced by the backend.
///
/// Records arrive pre-ranked (index 0 is the most likely condition) and are
/// never re-sorted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub condition: String,
    pub confidence: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub matched_symptoms: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missing_symptoms: Vec<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub recommendations: Option<String>,
}

#[cfg(test)]
impl DiagnosisRecord {
    pub fn new(condition: impl Into<String>, confidence: f64) -> Self {
        Self {
            condition: condition.into(),
            confidence,
            matched_symptoms: Vec::new(),
            missing_symptoms: Vec::new(),
            description: None,
            recommendations: None,
        }
    }

    pub fn with_matched<I, S>(mut self, symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matched_symptoms = symptoms.into_iter().map(Into::into).collect();
        self
    }
}

/// Request for a single chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

/// Reply to a chat turn
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    #[serde(rename = "message")]
    pub text: String,
    #[serde(default)]
    pub diagnosis: Option<Vec<DiagnosisRecord>>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    /// Conversation phase reported by the backend (informational only)
    #[serde(default)]
    pub state: Option<String>,
}

#[cfg(test)]
impl ChatReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            diagnosis: None,
            suggestions: None,
            state: None,
        }
    }

    pub fn with_diagnosis(mut self, diagnosis: Vec<DiagnosisRecord>) -> Self {
        self.diagnosis = Some(diagnosis);
        self
    }

    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = Some(suggestions.into_iter().map(Into::into).collect());
        self
    }
}

/// A persisted record of one completed consultation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationHistoryEntry {
    /// ISO-8601 timestamp as stored by the backend (usually without offset)
    pub timestamp: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub diagnoses: Vec<DiagnosisRecord>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub session_id: Option<String>,
}

/// Envelope of `GET /api/history/{user}`
#[derive(Debug, Deserialize)]
pub(crate) struct HistoryEnvelope {
    pub success: bool,
    #[serde(default)]
    pub history: Vec<ConsultationHistoryEntry>,
}

/// Envelope of `DELETE /api/history/{user}`
#[derive(Debug, Deserialize)]
pub(crate) struct SuccessEnvelope {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SymptomsEnvelope {
    pub symptoms: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConditionsEnvelope {
    pub conditions: Vec<String>,
}

/// Response of the backend health check
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResetRequest<'a> {
    pub session_id: &'a str,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// The backend fills absent descriptions with "".
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}
