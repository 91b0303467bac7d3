//! Relevance Validator
//!
//! Evidence-based acceptance of detected conflicts and challenges. A finding
//! survives only if it can be traced to the analyzed text, either verbatim or
//! through key-term overlap. Validation rejects; it never repairs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{ArchitecturalConflict, RelevanceSettings, TechnicalChallenge};

use super::text::{normalize_for_match, normalize_text, significant_terms};

/// Placeholder phrases matched on word boundaries of the normalized span
const PLACEHOLDER_PHRASES: &[&str] = &[
    "requirement a",
    "requirement b",
    "requirement x",
    "requirement y",
    "requirement 1",
    "requirement 2",
    "feature a",
    "feature b",
    "feature x",
    "feature y",
    "lorem ipsum",
    "example requirement",
    "sample requirement",
    "some requirement",
    "another requirement",
    "placeholder",
];

/// Template markers matched on the raw lowercase span
const PLACEHOLDER_MARKERS: &[&str] = &["[requirement", "<requirement", "{requirement", "[insert", "<insert"];

/// Domain-agnostic concerns models report out of habit
const GENERIC_PATTERNS: &[&str] = &[
    "technical debt",
    "browser compatibility",
    "cross-browser",
    "vendor lock-in",
    "scalability concerns",
    "scalability issues",
    "security vulnerabilities",
    "performance bottleneck",
    "maintainability",
    "code quality",
    "team expertise",
    "learning curve",
    "third-party dependencies",
    "future-proof",
];

/// Which list a generic issue was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Conflict,
    Challenge,
}

/// A finding matching a boilerplate pattern the source never mentions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericIssue {
    pub kind: FindingKind,
    /// Position in the list that was checked
    pub index: usize,
    pub pattern: String,
}

/// Pre-normalized source text
struct SourceEvidence {
    text: String,
    terms: HashSet<String>,
}

impl SourceEvidence {
    fn new(source: &str) -> Self {
        Self {
            text: source
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
            terms: significant_terms(source),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelevanceValidator {
    settings: RelevanceSettings,
}

impl RelevanceValidator {
    pub fn new(settings: RelevanceSettings) -> Self {
        Self { settings }
    }

    /// Whether a span is generic-example boilerplate
    pub fn is_placeholder(span: &str) -> bool {
        let lower = span.to_lowercase();
        if PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m)) {
            return true;
        }
        let padded = format!(" {} ", normalize_text(span));
        PLACEHOLDER_PHRASES
            .iter()
            .any(|p| padded.contains(&format!(" {} ", p)))
    }

    /// Fraction of the span's key terms present in the source; `None` when
    /// the span has no key terms
    pub fn term_overlap(span: &str, source: &str) -> Option<f64> {
        Self::overlap_with(span, &significant_terms(source))
    }

    fn overlap_with(span: &str, source_terms: &HashSet<String>) -> Option<f64> {
        let terms = significant_terms(span);
        if terms.is_empty() {
            return None;
        }
        let present = terms.iter().filter(|t| source_terms.contains(*t)).count();
        Some(present as f64 / terms.len() as f64)
    }

    fn is_verbatim(span: &str, source: &SourceEvidence) -> bool {
        let needle = normalize_for_match(span);
        !needle.is_empty() && source.text.contains(&needle)
    }

    fn is_grounded(span: &str, source: &SourceEvidence, min_overlap: f64) -> bool {
        if Self::is_placeholder(span) {
            return false;
        }
        if Self::is_verbatim(span, source) {
            return true;
        }
        Self::overlap_with(span, &source.terms)
            .map(|overlap| overlap >= min_overlap)
            .unwrap_or(false)
    }

    /// Keep conflicts whose two spans are both traceable to `source`
    pub fn validate_conflicts(
        &self,
        conflicts: &[ArchitecturalConflict],
        source: &str,
    ) -> Vec<ArchitecturalConflict> {
        let evidence = SourceEvidence::new(source);
        let min = self.settings.conflict_term_overlap;
        let kept: Vec<ArchitecturalConflict> = conflicts
            .iter()
            .filter(|c| {
                let grounded = Self::is_grounded(&c.requirement1, &evidence, min)
                    && Self::is_grounded(&c.requirement2, &evidence, min);
                if !grounded {
                    tracing::debug!(
                        requirement1 = %c.requirement1,
                        requirement2 = %c.requirement2,
                        "rejecting untraceable conflict"
                    );
                }
                grounded
            })
            .cloned()
            .collect();
        tracing::debug!(detected = conflicts.len(), kept = kept.len(), "conflicts validated");
        kept
    }

    /// Keep challenges whose evidence is traceable to `source`
    pub fn validate_challenges(
        &self,
        challenges: &[TechnicalChallenge],
        source: &str,
    ) -> Vec<TechnicalChallenge> {
        let evidence = SourceEvidence::new(source);
        let min = self.settings.challenge_term_overlap;
        let kept: Vec<TechnicalChallenge> = challenges
            .iter()
            .filter(|c| {
                let grounded = Self::is_grounded(c.evidence(), &evidence, min);
                if !grounded {
                    tracing::debug!(title = %c.title, "rejecting untraceable challenge");
                }
                grounded
            })
            .cloned()
            .collect();
        tracing::debug!(detected = challenges.len(), kept = kept.len(), "challenges validated");
        kept
    }

    /// Fraction of all findings that survive validation. Nothing detected scores 1.0.
    pub fn calculate_relevance_score(
        &self,
        conflicts: &[ArchitecturalConflict],
        challenges: &[TechnicalChallenge],
        source: &str,
    ) -> f64 {
        let detected = conflicts.len() + challenges.len();
        if detected == 0 {
            return 1.0;
        }
        let kept = self.validate_conflicts(conflicts, source).len()
            + self.validate_challenges(challenges, source).len();
        kept as f64 / detected as f64
    }

    /// Whether a pass scored too low to keep
    pub fn below_floor(&self, score: f64) -> bool {
        score < self.settings.min_relevance_score
    }

    /// Findings that repeat boilerplate the source never mentions
    pub fn detect_generic_issues(
        &self,
        conflicts: &[ArchitecturalConflict],
        challenges: &[TechnicalChallenge],
        source: &str,
    ) -> Vec<GenericIssue> {
        let source_lower = source.to_lowercase();
        let unsupported = |text: &str| -> Option<&'static str> {
            let lower = text.to_lowercase();
            GENERIC_PATTERNS
                .iter()
                .find(|p| lower.contains(*p) && !source_lower.contains(*p))
                .copied()
        };

        let from_conflicts = conflicts.iter().enumerate().filter_map(|(index, c)| {
            let text = format!("{} {} {}", c.requirement1, c.requirement2, c.resolution.approach);
            unsupported(&text).map(|pattern| GenericIssue {
                kind: FindingKind::Conflict,
                index,
                pattern: pattern.to_string(),
            })
        });
        let from_challenges = challenges.iter().enumerate().filter_map(|(index, c)| {
            let text = format!("{} {}", c.title, c.description);
            unsupported(&text).map(|pattern| GenericIssue {
                kind: FindingKind::Challenge,
                index,
                pattern: pattern.to_string(),
            })
        });

        let issues: Vec<GenericIssue> = from_conflicts.chain(from_challenges).collect();
        for issue in &issues {
            tracing::warn!(kind = ?issue.kind, index = issue.index, pattern = %issue.pattern, "generic finding not grounded in source");
        }
        issues
    }
}
