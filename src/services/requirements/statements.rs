//! Requirement Statements
//!
//! Splits free text into discrete requirement statements and groups them
//! into detection batches.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::DetectionSettings;

use super::text::truncate_chars;

/// Bullets (`-`, `*`, `+`, `•`), numbered (`1.`, `2)`) and lettered (`a)`) markers
fn marker_regex() -> Option<&'static Regex> {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    MARKER
        .get_or_init(|| Regex::new(r"^(?:[-*•+]|\d+[.)]|[a-zA-Z][.)])\s+").ok())
        .as_ref()
}

/// Extract requirement statements.
///
/// A marker line starts a statement, a heading or blank line ends one, and
/// any other line continues the current statement (soft wrap).
pub fn extract_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    let mut flush = |current: &mut String| {
        let statement = current.trim();
        if !statement.is_empty() {
            statements.push(statement.to_string());
        }
        current.clear();
    };

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            flush(&mut current);
            continue;
        }

        if let Some(marker) = marker_regex().and_then(|re| re.find(trimmed)) {
            flush(&mut current);
            current.push_str(trimmed[marker.end()..].trim());
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(trimmed);
        }
    }
    flush(&mut current);

    statements
}

/// Statements containing any critical keyword (case-insensitive)
pub fn critical_statements(statements: &[String], keywords: &[String]) -> Vec<String> {
    statements
        .iter()
        .filter(|s| {
            let lower = s.to_lowercase();
            keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
        })
        .cloned()
        .collect()
}

/// Work units for one detection pass
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionPlan {
    /// One request per batch
    pub batches: Vec<Vec<String>>,
    /// Extra cross-batch pass over critical statements, when warranted
    pub critical_pass: Option<Vec<String>>,
}

impl DetectionPlan {
    /// Build batches from raw text.
    ///
    /// Fewer than two statements sends the whole text as one request.
    /// The critical pass only exists when critical statements span more
    /// than one batch's worth of input.
    pub fn build(text: &str, settings: &DetectionSettings, with_critical_pass: bool) -> Self {
        let statements = extract_statements(text);
        if statements.len() < 2 {
            let whole = text.trim();
            let batches = if whole.is_empty() {
                Vec::new()
            } else {
                vec![vec![whole.to_string()]]
            };
            return Self {
                batches,
                critical_pass: None,
            };
        }

        let truncated: Vec<String> = statements
            .iter()
            .map(|s| truncate_chars(s, settings.statement_max_chars))
            .collect();

        let batches: Vec<Vec<String>> = truncated
            .chunks(settings.batch_size.max(1))
            .map(|chunk| chunk.to_vec())
            .collect();

        let critical_pass = if with_critical_pass && batches.len() > 1 {
            let critical = critical_statements(&truncated, &settings.critical_keywords);
            (critical.len() >= 2).then_some(critical)
        } else {
            None
        };

        Self {
            batches,
            critical_pass,
        }
    }

    pub fn request_count(&self) -> usize {
        self.batches.len() + usize::from(self.critical_pass.is_some())
    }
}
