//! Clarification Deduplicator
//!
//! Two questions are duplicates when either metric crosses its threshold:
//! - edit similarity of the normalized text (near-identical phrasing)
//! - Jaccard similarity of significant terms (reordered or rephrased)

use crate::models::DedupSettings;

use super::text::{edit_similarity, jaccard_similarity, significant_terms};

#[derive(Debug, Clone, Default)]
pub struct ClarificationDeduplicator {
    settings: DedupSettings,
}

impl ClarificationDeduplicator {
    pub fn new(settings: DedupSettings) -> Self {
        Self { settings }
    }

    pub fn are_duplicates(&self, a: &str, b: &str) -> bool {
        let edit = edit_similarity(a, b);
        let jaccard = jaccard_similarity(&significant_terms(a), &significant_terms(b));
        edit > self.settings.edit_similarity || jaccard > self.settings.word_jaccard
    }

    /// Merge two ordered lists. `primary` entries win over similar
    /// `secondary` ones; first-seen order is preserved.
    pub fn merge(&self, primary: &[String], secondary: &[String]) -> Vec<String> {
        let mut merged: Vec<String> = Vec::new();
        for candidate in primary.iter().chain(secondary) {
            let candidate = candidate.trim();
            if candidate.is_empty() {
                continue;
            }
            if merged.iter().any(|kept| self.are_duplicates(kept, candidate)) {
                tracing::debug!(question = candidate, "dropping duplicate clarification");
                continue;
            }
            merged.push(candidate.to_string());
        }
        merged
    }

    /// Drop answered questions that duplicate an earlier one
    pub fn dedupe_answers(&self, answers: Vec<(String, String)>) -> Vec<(String, String)> {
        let mut kept: Vec<(String, String)> = Vec::new();
        for (question, answer) in answers {
            if kept.iter().any(|(q, _)| self.are_duplicates(q, &question)) {
                continue;
            }
            kept.push((question, answer));
        }
        kept
    }
}
