//! Requirements Models
//!
//! Data structures produced by the analysis pipeline: per-pass analyses,
//! detected conflicts and challenges, and the final enriched record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Confidence used when the service response carries none
pub const NEUTRAL_CONFIDENCE: u8 = 50;

fn neutral_confidence() -> u8 {
    NEUTRAL_CONFIDENCE
}

/// Result of one analysis call. One instance per call; never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementsAnalysis {
    /// 0-100
    #[serde(
        default = "neutral_confidence",
        deserialize_with = "lenient_confidence"
    )]
    pub confidence: u8,
    #[serde(
        default,
        alias = "clarificationsNeeded",
        alias = "clarifications",
        deserialize_with = "lenient_string_list"
    )]
    pub clarifications_needed: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub assumptions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub gaps: Vec<String>,
}

impl Default for RequirementsAnalysis {
    fn default() -> Self {
        Self {
            confidence: NEUTRAL_CONFIDENCE,
            clarifications_needed: Vec::new(),
            assumptions: Vec::new(),
            gaps: Vec::new(),
        }
    }
}

/// Accepts integers, floats and numeric strings; clamps to 0-100.
/// Anything else falls back to the neutral value.
fn lenient_confidence<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let number = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number
        .filter(|n| n.is_finite())
        .map(|n| n.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(NEUTRAL_CONFIDENCE))
}

/// Accepts a list, a single string, or null. Non-string items are stringified.
fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(string_list(&value))
}

pub(crate) fn string_list(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s.trim().to_string()),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        serde_json::Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Kind of tension between two requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictType {
    PerformanceVsFeature,
    SecurityVsUsability,
    ScaleVsSimplicity,
    RealtimeVsOffline,
    PrivacyVsFunctionality,
    MutuallyExclusive,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::PerformanceVsFeature => "performanceVsFeature",
            ConflictType::SecurityVsUsability => "securityVsUsability",
            ConflictType::ScaleVsSimplicity => "scaleVsSimplicity",
            ConflictType::RealtimeVsOffline => "realtimeVsOffline",
            ConflictType::PrivacyVsFunctionality => "privacyVsFunctionality",
            ConflictType::MutuallyExclusive => "mutuallyExclusive",
        }
    }

    /// Parse a tag in camelCase, snake_case or spaced form
    pub fn parse(tag: &str) -> Option<Self> {
        let key: String = tag
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "performancevsfeature" => Some(ConflictType::PerformanceVsFeature),
            "securityvsusability" => Some(ConflictType::SecurityVsUsability),
            "scalevssimplicity" => Some(ConflictType::ScaleVsSimplicity),
            "realtimevsoffline" => Some(ConflictType::RealtimeVsOffline),
            "privacyvsfunctionality" => Some(ConflictType::PrivacyVsFunctionality),
            "mutuallyexclusive" => Some(ConflictType::MutuallyExclusive),
            _ => None,
        }
    }

    /// Keyword lookup over free text. First match wins.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has(&["mutually exclusive", "cannot both", "contradict"]) {
            ConflictType::MutuallyExclusive
        } else if has(&["real-time", "realtime", "real time"]) && has(&["offline"]) {
            ConflictType::RealtimeVsOffline
        } else if has(&["privacy", "anonymous", "gdpr", "personal data", "tracking"]) {
            ConflictType::PrivacyVsFunctionality
        } else if has(&["security", "encrypt", "authentication", "password", "2fa", "mfa"]) {
            ConflictType::SecurityVsUsability
        } else if has(&["scale", "scalab", "million", "simple", "simplicity"]) {
            ConflictType::ScaleVsSimplicity
        } else if has(&["performance", "latency", "fast", "speed", "response time"]) {
            ConflictType::PerformanceVsFeature
        } else {
            ConflictType::MutuallyExclusive
        }
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Conflict severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" | "minor" => Some(Severity::Low),
            "medium" | "moderate" => Some(Severity::Medium),
            "high" | "major" => Some(Severity::High),
            "critical" | "blocker" => Some(Severity::Critical),
            _ => None,
        }
    }

    /// Infer a severity from surrounding prose
    ///
    /// Whole words only: "slow" is not low and "highlight" is not high.
    pub fn from_keywords(text: &str) -> Self {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let mentions = |terms: &[&str]| terms.iter().any(|t| words.contains(t));

        if mentions(&["critical", "blocker", "blockers"]) {
            Severity::Critical
        } else if mentions(&["high", "severe", "major"]) {
            Severity::High
        } else if mentions(&["low", "minor"]) {
            Severity::Low
        } else {
            Severity::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Challenge priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn parse(value: &str) -> Option<Self> {
        Severity::parse(value).map(Priority::from)
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, Priority::High | Priority::Critical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl From<Severity> for Priority {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => Priority::Low,
            Severity::Medium => Priority::Medium,
            Severity::High => Priority::High,
            Severity::Critical => Priority::Critical,
        }
    }
}

/// Forced tradeoff for a conflict
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub approach: String,
    pub tradeoffs: Vec<String>,
    pub recommendation: String,
}

/// A pair of stated requirements that cannot both be fully satisfied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitecturalConflict {
    pub requirement1: String,
    pub requirement2: String,
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub resolution: Resolution,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub real_world_examples: Vec<String>,
}

impl ArchitecturalConflict {
    /// Conflict with classification inferred from the two spans
    pub fn between(requirement1: impl Into<String>, requirement2: impl Into<String>) -> Self {
        let requirement1 = requirement1.into();
        let requirement2 = requirement2.into();
        let combined = format!("{} {}", requirement1, requirement2);
        Self {
            conflict_type: ConflictType::classify(&combined),
            severity: Severity::Medium,
            resolution: Resolution::default(),
            real_world_examples: Vec::new(),
            requirement1,
            requirement2,
        }
    }
}

/// How bad an unaddressed challenge gets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeImpact {
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// An implementation difficulty implied by an explicitly stated requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalChallenge {
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub impact: ChallengeImpact,
    pub detection_point: String,
    pub preventive_measures: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_requirement: Option<String>,
}

impl TechnicalChallenge {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category: "general".to_string(),
            priority: Priority::Medium,
            impact: ChallengeImpact {
                severity: Severity::Medium,
                description: String::new(),
            },
            detection_point: String::new(),
            preventive_measures: Vec::new(),
            related_requirement: None,
        }
    }

    /// Text checked against the source during validation
    pub fn evidence(&self) -> &str {
        match self.related_requirement.as_deref() {
            Some(excerpt) if !excerpt.trim().is_empty() => excerpt,
            _ => &self.description,
        }
    }
}

/// Pipeline states, in visiting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisState {
    AnalyzingInitial,
    CriticallyLow,
    FilteringByConfidence,
    DetectingArchitecturalIssues,
    PresentingClarifications,
    CollectingClarifications,
    Reanalyzing,
    Finalizing,
    Complete,
}

impl std::fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnalysisState::AnalyzingInitial => "analyzing_initial",
            AnalysisState::CriticallyLow => "critically_low",
            AnalysisState::FilteringByConfidence => "filtering_by_confidence",
            AnalysisState::DetectingArchitecturalIssues => "detecting_architectural_issues",
            AnalysisState::PresentingClarifications => "presenting_clarifications",
            AnalysisState::CollectingClarifications => "collecting_clarifications",
            AnalysisState::Reanalyzing => "reanalyzing",
            AnalysisState::Finalizing => "finalizing",
            AnalysisState::Complete => "complete",
        };
        write!(f, "{}", name)
    }
}

/// Final record for one top-level request. Never mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRequirements {
    pub request_id: String,
    pub original_input: String,
    pub enriched_input: String,
    /// question -> answer
    pub clarifications: BTreeMap<String, String>,
    pub assumptions: Vec<String>,
    pub gaps: Vec<String>,
    pub overall_confidence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professional_analysis_summary: Option<String>,
    pub conflicts: Vec<ArchitecturalConflict>,
    pub challenges: Vec<TechnicalChallenge>,
    pub technical_stack_notes: Vec<String>,
    pub relevance_score: f64,
    pub state_trace: Vec<AnalysisState>,
    pub analyzed_at: DateTime<Utc>,
}

impl EnrichedRequirements {
    pub fn visited(&self, state: AnalysisState) -> bool {
        self.state_trace.contains(&state)
    }
}
