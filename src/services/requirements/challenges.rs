//! Technical Challenge Predictor
//!
//! Same batching and parsing pipeline as the conflict detector, without the
//! critical cross-batch pass. Findings are deduplicated by title.

use std::collections::HashSet;
use std::sync::Arc;

use requirements_cascade_llm::LlmProvider;
use serde_json::Value;

use crate::models::requirements::string_list;
use crate::models::{
    AnalysisSettings, ChallengeImpact, DetectionSettings, Priority, Severity, TechnicalChallenge,
};

use super::conflicts::{quoted_spans, str_field};
use super::fanout::dispatch_prompts;
use super::prompts::{self, DetectionStrictness, NO_CHALLENGES_MARKER};
use super::statements::DetectionPlan;
use super::structured::ParsedResponse;
use super::text::{normalize_text, truncate_chars};

const NO_CHALLENGE_PHRASES: &[&str] = &[
    "no challenge",
    "no technical challenge",
    "no significant challenge",
    "none found",
    "none.",
];

const MAX_TITLE_CHARS: usize = 80;

pub struct ChallengePredictor {
    provider: Arc<dyn LlmProvider>,
    detection: DetectionSettings,
    temperature: f32,
    strict_temperature: f32,
}

impl ChallengePredictor {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: &AnalysisSettings) -> Self {
        Self {
            provider,
            detection: settings.detection.clone(),
            temperature: settings.temperatures.detection,
            strict_temperature: settings.temperatures.strict_detection,
        }
    }

    pub async fn predict(
        &self,
        text: &str,
        strictness: DetectionStrictness,
    ) -> Vec<TechnicalChallenge> {
        let plan = DetectionPlan::build(text, &self.detection, false);
        if plan.batches.is_empty() {
            return Vec::new();
        }

        let user_messages: Vec<String> = plan
            .batches
            .iter()
            .map(|batch| {
                format!(
                    "Requirement statements:\n{}",
                    prompts::numbered_statements(batch)
                )
            })
            .collect();

        let temperature = match strictness {
            DetectionStrictness::Standard => self.temperature,
            DetectionStrictness::Strict => self.strict_temperature,
        };

        let found = dispatch_prompts(
            "challenge_prediction",
            self.provider.clone(),
            prompts::challenge_detection_prompt(strictness),
            user_messages,
            temperature,
            self.detection.max_concurrent_batches,
            parse_challenge_response,
        )
        .await;

        let challenges = dedup_challenges(found);
        tracing::debug!(count = challenges.len(), ?strictness, "challenge prediction complete");
        challenges
    }
}

pub fn signals_no_challenges(text: &str) -> bool {
    if text.contains(NO_CHALLENGES_MARKER) {
        return true;
    }
    let lead = text
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    NO_CHALLENGE_PHRASES.iter().any(|p| lead.starts_with(p))
}

/// Parse one batch response
pub fn parse_challenge_response(text: &str) -> Vec<TechnicalChallenge> {
    if text.trim().is_empty() || signals_no_challenges(text) {
        return Vec::new();
    }

    if let ParsedResponse::Structured(value) = ParsedResponse::parse(text) {
        let items = match &value {
            Value::Array(items) => Some(items),
            Value::Object(map) => map
                .get("challenges")
                .or_else(|| map.get("technical_challenges"))
                .or_else(|| map.get("technicalChallenges"))
                .and_then(Value::as_array),
            _ => None,
        };
        if let Some(items) = items {
            return items.iter().filter_map(challenge_from_value).collect();
        }
    }

    scan_prose_challenges(text)
}

fn challenge_from_value(value: &Value) -> Option<TechnicalChallenge> {
    let title = str_field(value, &["title", "name"])?;
    let description = str_field(value, &["description", "details"]).unwrap_or(title);

    let mut challenge = TechnicalChallenge::new(title, description);
    if let Some(category) = str_field(value, &["category"]) {
        challenge.category = category.to_string();
    }
    challenge.priority = str_field(value, &["priority"])
        .and_then(Priority::parse)
        .unwrap_or(Priority::Medium);

    challenge.impact = match value.get("impact") {
        Some(impact @ Value::Object(_)) => ChallengeImpact {
            severity: str_field(impact, &["severity"])
                .and_then(Severity::parse)
                .unwrap_or(Severity::Medium),
            description: str_field(impact, &["description"])
                .unwrap_or_default()
                .to_string(),
        },
        Some(Value::String(text)) => ChallengeImpact {
            severity: Severity::parse(text).unwrap_or_else(|| Severity::from_keywords(text)),
            description: String::new(),
        },
        _ => challenge.impact.clone(),
    };

    challenge.detection_point = str_field(value, &["detectionPoint", "detection_point"])
        .unwrap_or_default()
        .to_string();
    challenge.preventive_measures = ["preventiveMeasures", "preventive_measures", "mitigations"]
        .iter()
        .find_map(|k| value.get(*k))
        .map(string_list)
        .unwrap_or_default();
    challenge.related_requirement =
        str_field(value, &["relatedRequirement", "related_requirement"]).map(str::to_string);

    Some(challenge)
}

/// Heuristic fallback: a paragraph quoting a requirement becomes a
/// challenge titled by its first line.
pub fn scan_prose_challenges(text: &str) -> Vec<TechnicalChallenge> {
    text.split("\n\n")
        .filter_map(|paragraph| {
            let quoted = quoted_spans(paragraph).into_iter().next()?;
            let first_line = paragraph.lines().next().unwrap_or_default();
            // list markers and emphasis are not part of the title
            let title = first_line
                .trim_start_matches(|c: char| !c.is_alphabetic())
                .split(':')
                .next()
                .unwrap_or_default()
                .trim_end_matches(|c: char| !c.is_alphanumeric())
                .trim();
            if title.is_empty() {
                return None;
            }

            let description = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
            let mut challenge =
                TechnicalChallenge::new(truncate_chars(title, MAX_TITLE_CHARS), description);
            challenge.priority = Priority::from(Severity::from_keywords(paragraph));
            challenge.impact.severity = Severity::from_keywords(paragraph);
            challenge.related_requirement = Some(quoted);
            Some(challenge)
        })
        .collect()
}

/// First occurrence of each normalized title wins
pub fn dedup_challenges(challenges: Vec<TechnicalChallenge>) -> Vec<TechnicalChallenge> {
    let mut seen = HashSet::new();
    challenges
        .into_iter()
        .filter(|c| seen.insert(normalize_text(&c.title)))
        .collect()
}
