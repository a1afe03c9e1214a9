//! Bot reply formatting
//!
//! Replies may contain `**bold**` runs and line breaks. Control characters
//! are stripped before those two transforms are applied; nothing else from
//! the backend is interpreted as markup.

use crossterm::style::Stylize;
use regex::Regex;
use std::sync::OnceLock;

/// Inline piece of a formatted reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(String),
    LineBreak,
}

fn bold_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"))
}

/// Drop control characters that a terminal would interpret (escape
/// sequences, carriage returns, bells). Newlines and tabs survive.
pub fn sanitize_terminal(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Split sanitized reply text into inline pieces
pub fn parse(raw: &str) -> Vec<Inline> {
    let clean = sanitize_terminal(raw);
    let mut pieces = Vec::new();

    for (index, line) in clean.split('\n').enumerate() {
        if index > 0 {
            pieces.push(Inline::LineBreak);
        }
        let mut cursor = 0;
        for captures in bold_pattern().captures_iter(line) {
            let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if let Some(text) = line.get(cursor..whole.start()).filter(|t| !t.is_empty()) {
                pieces.push(Inline::Text(text.to_string()));
            }
            pieces.push(Inline::Bold(inner.as_str().to_string()));
            cursor = whole.end();
        }
        if let Some(rest) = line.get(cursor..).filter(|t| !t.is_empty()) {
            pieces.push(Inline::Text(rest.to_string()));
        }
    }
    pieces
}

/// Render reply text for an ANSI terminal
pub fn to_terminal(raw: &str) -> String {
    let mut out = String::new();
    for piece in parse(raw) {
        match piece {
            Inline::Text(text) => out.push_str(&text),
            Inline::Bold(text) => out.push_str(&text.bold().to_string()),
            Inline::LineBreak => out.push('\n'),
        }
    }
    out
}
