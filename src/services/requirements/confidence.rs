//! Confidence Evaluator
//!
//! Threshold classification plus confidence-driven filtering and boosting.
//! Pure functions over the configured thresholds.

use serde::{Deserialize, Serialize};

use crate::models::{ConfidenceSettings, ConfidenceThresholds, RequirementsAnalysis};

/// Where a confidence value falls relative to the thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    NonViable,
    NeedsRefinement,
    NeedsClarification,
    Acceptable,
    High,
}

impl ConfidenceBand {
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceBand::NonViable => "non-viable",
            ConfidenceBand::NeedsRefinement => "needs refinement",
            ConfidenceBand::NeedsClarification => "needs clarification",
            ConfidenceBand::Acceptable => "acceptable",
            ConfidenceBand::High => "high",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfidenceEvaluator {
    thresholds: ConfidenceThresholds,
    settings: ConfidenceSettings,
}

impl ConfidenceEvaluator {
    pub fn new(thresholds: ConfidenceThresholds, settings: ConfidenceSettings) -> Self {
        Self {
            thresholds,
            settings,
        }
    }

    pub fn band(&self, confidence: u8) -> ConfidenceBand {
        let t = &self.thresholds;
        if confidence < t.non_viable {
            ConfidenceBand::NonViable
        } else if confidence < t.needs_refinement {
            ConfidenceBand::NeedsRefinement
        } else if confidence < t.needs_clarification {
            ConfidenceBand::NeedsClarification
        } else if confidence < t.high_confidence {
            ConfidenceBand::Acceptable
        } else {
            ConfidenceBand::High
        }
    }

    pub fn is_non_viable(&self, confidence: u8) -> bool {
        confidence < self.thresholds.non_viable
    }

    pub fn needs_refinement(&self, confidence: u8) -> bool {
        confidence < self.thresholds.needs_refinement
    }

    pub fn needs_clarification(&self, confidence: u8) -> bool {
        confidence < self.thresholds.needs_clarification
    }

    pub fn is_high_confidence(&self, confidence: u8) -> bool {
        confidence >= self.thresholds.high_confidence
    }

    /// Trim an analysis according to its own confidence.
    ///
    /// - below non-viable: no clarifications, no assumptions, gaps kept
    /// - below needs-refinement: top-K clarifications, hedged assumptions dropped
    /// - otherwise unchanged
    pub fn filter_by_confidence(&self, analysis: &RequirementsAnalysis) -> RequirementsAnalysis {
        match self.band(analysis.confidence) {
            ConfidenceBand::NonViable => RequirementsAnalysis {
                confidence: analysis.confidence,
                clarifications_needed: Vec::new(),
                assumptions: Vec::new(),
                gaps: analysis.gaps.clone(),
            },
            ConfidenceBand::NeedsRefinement => RequirementsAnalysis {
                confidence: analysis.confidence,
                clarifications_needed: analysis
                    .clarifications_needed
                    .iter()
                    .take(self.settings.refinement_top_k)
                    .cloned()
                    .collect(),
                assumptions: analysis
                    .assumptions
                    .iter()
                    .filter(|a| !self.is_hedged(a))
                    .cloned()
                    .collect(),
                gaps: analysis.gaps.clone(),
            },
            _ => analysis.clone(),
        }
    }

    /// Whether an assumption uses speculative language
    pub fn is_hedged(&self, assumption: &str) -> bool {
        let lower = assumption.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        self.settings.hedging_terms.iter().any(|term| {
            let term = term.to_lowercase();
            if term.contains(' ') {
                lower.contains(&term)
            } else {
                words.contains(&term.as_str())
            }
        })
    }

    /// Rounded mean of the two scores, plus the bonus when clarifications
    /// were provided, capped at 100.
    pub fn calculate_overall_confidence(
        &self,
        requirements_confidence: u8,
        stack_confidence: u8,
        clarifications_provided: bool,
    ) -> u8 {
        let average = (f64::from(requirements_confidence) + f64::from(stack_confidence)) / 2.0;
        let mut overall = average.round() as u32;
        if clarifications_provided {
            overall += u32::from(self.settings.clarification_bonus);
        }
        overall.min(100) as u8
    }
}

impl Default for ConfidenceEvaluator {
    fn default() -> Self {
        Self::new(ConfidenceThresholds::default(), ConfidenceSettings::default())
    }
}
