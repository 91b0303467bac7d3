//! Analysis Settings
//!
//! Every tunable of the analysis pipeline: confidence thresholds, sampling
//! temperatures, detection batching, relevance and dedup cut-offs, and the
//! context budget. Loaded from TOML; every section falls back to defaults.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, AppResult};

/// Top-level analysis configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub thresholds: ConfidenceThresholds,
    pub confidence: ConfidenceSettings,
    pub temperatures: TemperatureSettings,
    pub detection: DetectionSettings,
    pub relevance: RelevanceSettings,
    pub dedup: DedupSettings,
    pub budget: BudgetSettings,
}

/// Confidence bands, on the 0-100 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    /// Below this the request cannot be analyzed at all
    pub non_viable: u8,
    /// Below this, clarifications are trimmed and hedged assumptions dropped
    pub needs_refinement: u8,
    /// Below this, clarification is offered even with no candidate questions
    pub needs_clarification: u8,
    pub high_confidence: u8,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            non_viable: 40,
            needs_refinement: 60,
            needs_clarification: 70,
            high_confidence: 85,
        }
    }
}

/// Filtering and boosting knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceSettings {
    /// Added to the overall confidence when the user answered clarifications
    pub clarification_bonus: u8,
    /// Clarifications kept in the needs-refinement band
    pub refinement_top_k: usize,
    /// Words marking an assumption as speculative
    pub hedging_terms: Vec<String>,
}

impl Default for ConfidenceSettings {
    fn default() -> Self {
        Self {
            clarification_bonus: 15,
            refinement_top_k: 3,
            hedging_terms: [
                "might",
                "possibly",
                "probably",
                "perhaps",
                "maybe",
                "likely",
                "potentially",
                "unclear",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Sampling temperatures for each prompt family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureSettings {
    pub analysis: f32,
    pub detection: f32,
    pub strict_detection: f32,
}

impl Default for TemperatureSettings {
    fn default() -> Self {
        Self {
            analysis: 0.3,
            detection: 0.3,
            strict_detection: 0.1,
        }
    }
}

/// Conflict/challenge detection batching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub batch_size: usize,
    /// Statements longer than this are cut before being sent
    pub statement_max_chars: usize,
    pub max_concurrent_batches: usize,
    /// Statements containing any of these get an extra cross-batch pass
    pub critical_keywords: Vec<String>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            batch_size: 3,
            statement_max_chars: 150,
            max_concurrent_batches: 4,
            critical_keywords: [
                "real-time",
                "realtime",
                "offline",
                "encryption",
                "encrypted",
                "scale",
                "concurrent",
                "distributed",
                "latency",
                "privacy",
                "gdpr",
                "sync",
                "anonymous",
                "audit",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Traceability cut-offs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceSettings {
    pub conflict_term_overlap: f64,
    pub challenge_term_overlap: f64,
    /// Passes scoring below this are re-run with the strict prompt
    pub min_relevance_score: f64,
}

impl Default for RelevanceSettings {
    fn default() -> Self {
        Self {
            conflict_term_overlap: 0.75,
            challenge_term_overlap: 0.5,
            min_relevance_score: 0.5,
        }
    }
}

/// Clarification similarity cut-offs (strictly greater than merges)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupSettings {
    pub edit_similarity: f64,
    pub word_jaccard: f64,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            edit_similarity: 0.7,
            word_jaccard: 0.6,
        }
    }
}

/// Prompt-context budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSettings {
    pub chars_per_token: usize,
    /// Token ceiling used when no provider-specific one is configured
    pub default_token_ceiling: usize,
    /// Token ceilings keyed by provider name ("anthropic", "openai", "ollama")
    pub provider_token_ceilings: HashMap<String, usize>,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        let provider_token_ceilings = [("anthropic", 8_000), ("openai", 6_000), ("ollama", 2_000)]
            .iter()
            .map(|(name, ceiling)| (name.to_string(), *ceiling))
            .collect();
        Self {
            chars_per_token: 4,
            default_token_ceiling: 4_000,
            provider_token_ceilings,
        }
    }
}

impl BudgetSettings {
    /// Token ceiling for a provider, falling back to the default
    pub fn token_ceiling_for(&self, provider: &str) -> usize {
        self.provider_token_ceilings
            .get(&provider.to_lowercase())
            .copied()
            .unwrap_or(self.default_token_ceiling)
    }
}

impl AnalysisSettings {
    /// Parse settings from a TOML document and validate them
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let settings: AnalysisSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded analysis settings");
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> AppResult<()> {
        let t = &self.thresholds;
        if t.high_confidence > 100 {
            return Err(AppError::config("high_confidence cannot exceed 100"));
        }
        if !(t.non_viable <= t.needs_refinement
            && t.needs_refinement <= t.needs_clarification
            && t.needs_clarification <= t.high_confidence)
        {
            return Err(AppError::config(format!(
                "thresholds must be non-decreasing: {} / {} / {} / {}",
                t.non_viable, t.needs_refinement, t.needs_clarification, t.high_confidence
            )));
        }

        if self.detection.batch_size == 0 {
            return Err(AppError::config("detection.batch_size must be at least 1"));
        }
        if self.detection.max_concurrent_batches == 0 {
            return Err(AppError::config(
                "detection.max_concurrent_batches must be at least 1",
            ));
        }
        if self.detection.statement_max_chars == 0 {
            return Err(AppError::config(
                "detection.statement_max_chars must be at least 1",
            ));
        }

        for (name, value) in [
            ("relevance.conflict_term_overlap", self.relevance.conflict_term_overlap),
            ("relevance.challenge_term_overlap", self.relevance.challenge_term_overlap),
            ("relevance.min_relevance_score", self.relevance.min_relevance_score),
            ("dedup.edit_similarity", self.dedup.edit_similarity),
            ("dedup.word_jaccard", self.dedup.word_jaccard),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::config(format!(
                    "{} must be within 0.0..=1.0, got {}",
                    name, value
                )));
            }
        }

        if self.budget.chars_per_token == 0 {
            return Err(AppError::config("budget.chars_per_token must be at least 1"));
        }

        Ok(())
    }
}
