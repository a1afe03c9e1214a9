//! Display projection of ranked diagnosis records
//!
//! Pure and borrowing: the projection never reorders or mutates the records
//! it is built from.

use crate::transport::DiagnosisRecord;

/// One display-ready diagnosis
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedDiagnosis<'a> {
    /// 1-based position in backend order
    pub rank: usize,
    pub condition: &'a str,
    /// Confidence with exactly one decimal digit, e.g. `"80.5%"`
    pub confidence_text: String,
    /// `confidence / 100`, not clamped
    pub bar_fraction: f64,
    pub matched_symptoms: &'a [String],
    pub missing_symptoms: &'a [String],
    pub description: Option<&'a str>,
    pub recommendations: Option<&'a str>,
}

/// Ranked diagnoses ready for rendering; never empty
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisProjection<'a> {
    entries: Vec<ProjectedDiagnosis<'a>>,
}

impl<'a> DiagnosisProjection<'a> {
    pub fn entries(&self) -> &[ProjectedDiagnosis<'a>] {
        &self.entries
    }

    /// Highest-ranked entry
    #[cfg(test)]
    pub fn top(&self) -> Option<&ProjectedDiagnosis<'a>> {
        self.entries.first()
    }
}

/// Format a confidence score as a one-decimal percentage
pub fn confidence_text(confidence: f64) -> String {
    format!("{confidence:.1}%")
}

/// Project a diagnosis list. `None` means there is nothing to render.
pub fn project(records: Option<&[DiagnosisRecord]>) -> Option<DiagnosisProjection<'_>> {
    let records = records.filter(|records| !records.is_empty())?;

    let entries = records
        .iter()
        .enumerate()
        .map(|(index, record)| ProjectedDiagnosis {
            rank: index + 1,
            condition: &record.condition,
            confidence_text: confidence_text(record.confidence),
            bar_fraction: record.confidence / 100.0,
            matched_symptoms: &record.matched_symptoms,
            missing_symptoms: &record.missing_symptoms,
            description: record.description.as_deref(),
            recommendations: record.recommendations.as_deref(),
        })
        .collect();

    Some(DiagnosisProjection { entries })
}
