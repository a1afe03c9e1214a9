//! Terminal presentation
//!
//! Everything here turns already-validated state into text. Backend strings
//! pass through `markup` before reaching the terminal.

use crate::diagnosis::{self, DiagnosisProjection};
use crate::history::{HistorySnapshot, HistoryStats};
use crate::markup;
use crate::state_machine::{Message, Role};
use crate::transport::ConsultationHistoryEntry;
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use crossterm::style::Stylize;
use std::fmt::Write;

const BAR_WIDTH: usize = 20;
const PREVIEW_SYMPTOMS: usize = 3;

pub const DISCLAIMER: &str = "This assistant provides general information only and is not a \
substitute for professional medical advice. Consult a healthcare provider for diagnosis and treatment.";

pub const NO_DIAGNOSIS: &str = "No diagnosis";

/// Local wall-clock `HH:MM`
pub fn format_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

/// Human date for a history timestamp, e.g. `January 5, 2024, 10:20 AM`.
///
/// Unparseable input is returned as-is.
pub fn format_date(raw: &str) -> String {
    const DISPLAY: &str = "%B %-d, %Y, %I:%M %p";

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Local).format(DISPLAY).to_string();
    }
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map_or_else(|_| raw.to_string(), |naive| naive.format(DISPLAY).to_string())
}

/// Confidence bar with the fill clamped to `[0, 1]`
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn render_bar(fraction: f64, width: usize) -> String {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    let filled = ((fraction * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn render_diagnosis(projection: &DiagnosisProjection<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {}", "Possible conditions:".bold());
    for entry in projection.entries() {
        let _ = writeln!(
            out,
            "  {}. {}  {}",
            entry.rank,
            markup::sanitize_terminal(entry.condition).bold(),
            entry.confidence_text.as_str().cyan()
        );
        let _ = writeln!(out, "     {}", render_bar(entry.bar_fraction, BAR_WIDTH));
        if !entry.matched_symptoms.is_empty() {
            let _ = writeln!(
                out,
                "     Matched: {}",
                markup::sanitize_terminal(&entry.matched_symptoms.join(", "))
            );
        }
        if !entry.missing_symptoms.is_empty() {
            let _ = writeln!(
                out,
                "     Also check: {}",
                markup::sanitize_terminal(&entry.missing_symptoms.join(", "))
            );
        }
        if let Some(description) = entry.description {
            let _ = writeln!(out, "     {}", markup::to_terminal(description));
        }
        if let Some(recommendations) = entry.recommendations {
            let _ = writeln!(
                out,
                "     Recommendations: {}",
                markup::to_terminal(recommendations)
            );
        }
    }
    out
}

/// One log entry, with its diagnosis card for bot replies
pub fn render_message(message: &Message) -> String {
    let time = format_time(message.timestamp);
    let mut out = match message.role {
        Role::User => format!(
            "[{time}] {} {}\n",
            "You:".green().bold(),
            markup::sanitize_terminal(&message.content)
        ),
        Role::Bot => format!(
            "[{time}] {} {}\n",
            "Assistant:".blue().bold(),
            markup::to_terminal(&message.content)
        ),
    };
    if let Some(projection) = diagnosis::project(message.diagnosis.as_deref()) {
        out.push_str(&render_diagnosis(&projection));
    }
    out
}

/// Numbered quick replies; empty when there are none
pub fn render_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        return String::new();
    }
    let mut out = format!("{}\n", "Quick replies:".dim());
    for (index, suggestion) in suggestions.iter().enumerate() {
        let _ = writeln!(
            out,
            "  [{}] {}",
            index + 1,
            markup::sanitize_terminal(suggestion)
        );
    }
    out
}

pub fn typing_indicator() -> String {
    format!("{}", "Assistant is typing...".dim().italic())
}

pub fn welcome_banner(username: &str) -> String {
    format!(
        "{}\nSigned in as {}. Type /help for commands.\n{}\n",
        "Symptom Checker".bold(),
        markup::sanitize_terminal(username).bold(),
        DISCLAIMER.dim()
    )
}

pub fn help_text() -> &'static str {
    "Commands:\n\
     \x20 /new          start a new consultation\n\
     \x20 /history      show consultation history\n\
     \x20 /show N       show history entry N\n\
     \x20 /clear        delete all consultation history\n\
     \x20 /symptoms     list known symptoms\n\
     \x20 /conditions   list known conditions\n\
     \x20 /logout       sign out\n\
     \x20 /quit         exit\n\
     A number selects the matching quick reply."
}

/// Top condition of a history entry, or [`NO_DIAGNOSIS`]
pub fn top_condition(entry: &ConsultationHistoryEntry) -> &str {
    entry
        .diagnoses
        .first()
        .map_or(NO_DIAGNOSIS, |record| record.condition.as_str())
}

/// First few symptoms plus a `+N more` tag for the remainder
pub fn symptom_preview(symptoms: &[String]) -> (&[String], Option<String>) {
    let shown = symptoms.len().min(PREVIEW_SYMPTOMS);
    let remaining = symptoms.len() - shown;
    let more = (remaining > 0).then(|| format!("+{remaining} more"));
    (&symptoms[..shown], more)
}

pub fn render_stats(stats: HistoryStats) -> String {
    format!(
        "Total consultations: {}  |  Unique symptoms: {}",
        stats.total_consultations, stats.unique_symptoms
    )
}

pub fn render_history_list(snapshot: &HistorySnapshot, stats: HistoryStats) -> String {
    let mut out = format!("{}\n", render_stats(stats).bold());
    if snapshot.entries.is_empty() {
        out.push_str("No consultation history yet.\n");
        return out;
    }
    for (index, entry) in snapshot.entries.iter().enumerate() {
        let (shown, more) = symptom_preview(&entry.symptoms);
        let mut symptoms = shown.join(", ");
        if let Some(more) = more {
            let _ = write!(symptoms, " {more}");
        }
        let _ = writeln!(
            out,
            "  [{}] {}  {}\n      {}",
            index + 1,
            markup::sanitize_terminal(top_condition(entry)).bold(),
            format_date(&entry.timestamp).dim(),
            markup::sanitize_terminal(&symptoms)
        );
    }
    out
}

pub fn render_history_detail(entry: &ConsultationHistoryEntry) -> String {
    let mut out = format!(
        "{}\n",
        format!("Consultation on {}", format_date(&entry.timestamp)).bold()
    );
    let _ = writeln!(out, "Symptoms:");
    if entry.symptoms.is_empty() {
        let _ = writeln!(out, "  (none recorded)");
    }
    for symptom in &entry.symptoms {
        let _ = writeln!(out, "  - {}", markup::sanitize_terminal(symptom));
    }
    match diagnosis::project(Some(entry.diagnoses.as_slice())) {
        Some(projection) => out.push_str(&render_diagnosis(&projection)),
        None => {
            let _ = writeln!(out, "{NO_DIAGNOSIS}");
        }
    }
    out
}

pub fn render_catalog(title: &str, items: &[String]) -> String {
    let mut out = format!("{} ({})\n", title.bold(), items.len());
    for item in items {
        let _ = writeln!(out, "  - {}", markup::sanitize_terminal(item));
    }
    out
}
