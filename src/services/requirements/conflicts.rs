//! Architectural Conflict Detector
//!
//! Splits the input into statement batches, asks the completion service
//! about each batch concurrently, and merges the findings.
//!
//! Response parsing order per batch:
//! 1. explicit "no conflicts" signal (the expected case)
//! 2. structured JSON block
//! 3. prose scan pairing quoted spans near conflict keywords

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use requirements_cascade_llm::LlmProvider;
use serde_json::Value;

use crate::models::requirements::string_list;
use crate::models::{
    AnalysisSettings, ArchitecturalConflict, ConflictType, DetectionSettings, Resolution,
    Severity,
};

use super::fanout::dispatch_prompts;
use super::prompts::{self, DetectionStrictness, NO_CONFLICTS_MARKER};
use super::statements::DetectionPlan;
use super::structured::ParsedResponse;
use super::text::normalize_text;

/// Word stems that mark a prose paragraph as describing a conflict
const CONFLICT_STEMS: &[&str] = &[
    "conflict",
    "contradict",
    "incompatib",
    "tension",
    "tradeoff",
    "versus",
];

/// Word sequences that mark a conflict, matched exactly
const CONFLICT_PHRASES: &[&[&str]] = &[
    &["vs"],
    &["trade", "off"],
    &["trade", "offs"],
    &["mutually", "exclusive"],
    &["cannot", "both"],
];

/// Leading phrases that mean "nothing found"
const NO_CONFLICT_PHRASES: &[&str] = &[
    "no conflict",
    "no architectural conflict",
    "no significant conflict",
    "none found",
    "none.",
];

pub struct ConflictDetector {
    provider: Arc<dyn LlmProvider>,
    detection: DetectionSettings,
    temperature: f32,
    strict_temperature: f32,
}

impl ConflictDetector {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: &AnalysisSettings) -> Self {
        Self {
            provider,
            detection: settings.detection.clone(),
            temperature: settings.temperatures.detection,
            strict_temperature: settings.temperatures.strict_detection,
        }
    }

    /// Run one detection pass over `text`
    pub async fn detect(
        &self,
        text: &str,
        strictness: DetectionStrictness,
    ) -> Vec<ArchitecturalConflict> {
        let plan = DetectionPlan::build(text, &self.detection, true);
        if plan.batches.is_empty() {
            return Vec::new();
        }

        let mut user_messages: Vec<String> = plan
            .batches
            .iter()
            .map(|batch| {
                format!(
                    "Requirement statements:\n{}",
                    prompts::numbered_statements(batch)
                )
            })
            .collect();
        if let Some(critical) = &plan.critical_pass {
            user_messages.push(format!(
                "Critical requirement statements gathered from the whole request. \
                 Check them against each other:\n{}",
                prompts::numbered_statements(critical)
            ));
        }

        let temperature = match strictness {
            DetectionStrictness::Standard => self.temperature,
            DetectionStrictness::Strict => self.strict_temperature,
        };

        tracing::debug!(
            batches = plan.batches.len(),
            critical_pass = plan.critical_pass.is_some(),
            ?strictness,
            "dispatching conflict detection"
        );

        let found = dispatch_prompts(
            "conflict_detection",
            self.provider.clone(),
            prompts::conflict_detection_prompt(strictness),
            user_messages,
            temperature,
            self.detection.max_concurrent_batches,
            parse_conflict_response,
        )
        .await;

        let conflicts = dedup_conflicts(found);
        tracing::debug!(count = conflicts.len(), "conflict detection complete");
        conflicts
    }
}

/// Whether a response says there is nothing to report
pub fn signals_no_conflicts(text: &str) -> bool {
    if text.contains(NO_CONFLICTS_MARKER) {
        return true;
    }
    let lead = text
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    NO_CONFLICT_PHRASES.iter().any(|p| lead.starts_with(p))
}

/// Parse one batch response
pub fn parse_conflict_response(text: &str) -> Vec<ArchitecturalConflict> {
    if text.trim().is_empty() || signals_no_conflicts(text) {
        return Vec::new();
    }

    if let ParsedResponse::Structured(value) = ParsedResponse::parse(text) {
        if let Some(items) = conflict_items(&value) {
            return items.iter().filter_map(conflict_from_value).collect();
        }
    }

    tracing::debug!("conflict response not structured; scanning prose");
    scan_prose_conflicts(text)
}

fn conflict_items(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map
            .get("conflicts")
            .or_else(|| map.get("architectural_conflicts"))
            .or_else(|| map.get("architecturalConflicts"))
            .and_then(Value::as_array),
        _ => None,
    }
}

/// First non-empty string among `keys`
pub(crate) fn str_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| value.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn conflict_from_value(value: &Value) -> Option<ArchitecturalConflict> {
    let requirement1 = str_field(value, &["requirement1", "requirement_1", "requirementA"])?;
    let requirement2 = str_field(value, &["requirement2", "requirement_2", "requirementB"])?;
    let description = str_field(value, &["description", "explanation"]).unwrap_or_default();

    let conflict_type = str_field(value, &["conflictType", "conflict_type", "type"])
        .and_then(ConflictType::parse)
        .unwrap_or_else(|| {
            ConflictType::classify(&format!("{} {} {}", requirement1, requirement2, description))
        });

    let severity = str_field(value, &["severity"])
        .and_then(Severity::parse)
        .unwrap_or_else(|| Severity::from_keywords(description));

    let resolution = match value.get("resolution") {
        Some(res @ Value::Object(_)) => Resolution {
            approach: str_field(res, &["approach"]).unwrap_or_default().to_string(),
            tradeoffs: res.get("tradeoffs").map(string_list).unwrap_or_default(),
            recommendation: str_field(res, &["recommendation"])
                .unwrap_or_default()
                .to_string(),
        },
        Some(Value::String(approach)) => Resolution {
            approach: approach.trim().to_string(),
            ..Default::default()
        },
        _ => Resolution::default(),
    };

    let real_world_examples = ["realWorldExamples", "real_world_examples", "examples"]
        .iter()
        .find_map(|k| value.get(*k))
        .map(string_list)
        .unwrap_or_default();

    Some(ArchitecturalConflict {
        requirement1: requirement1.to_string(),
        requirement2: requirement2.to_string(),
        conflict_type,
        severity,
        resolution,
        real_world_examples,
    })
}

fn quoted_span_regex() -> Option<&'static Regex> {
    static QUOTED: OnceLock<Option<Regex>> = OnceLock::new();
    QUOTED
        .get_or_init(|| Regex::new(r#""([^"\n]{3,})"|“([^”\n]{3,})”"#).ok())
        .as_ref()
}

/// Quoted spans in order of appearance
pub(crate) fn quoted_spans(text: &str) -> Vec<String> {
    let Some(re) = quoted_span_regex() else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Whether prose talks about a conflict, judged on whole words
fn mentions_conflict(paragraph: &str) -> bool {
    let lower = paragraph.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    words
        .iter()
        .any(|w| CONFLICT_STEMS.iter().any(|stem| w.starts_with(stem)))
        || CONFLICT_PHRASES
            .iter()
            .any(|phrase| words.windows(phrase.len()).any(|window| window == *phrase))
}

/// Heuristic fallback: within each paragraph that mentions a conflict,
/// pair consecutive quoted spans.
pub fn scan_prose_conflicts(text: &str) -> Vec<ArchitecturalConflict> {
    let mut conflicts = Vec::new();

    for paragraph in text.split("\n\n") {
        if !mentions_conflict(paragraph) {
            continue;
        }

        let spans = quoted_spans(paragraph);
        for pair in spans.chunks_exact(2) {
            let mut conflict = ArchitecturalConflict::between(pair[0].clone(), pair[1].clone());
            conflict.conflict_type = ConflictType::classify(paragraph);
            conflict.severity = Severity::from_keywords(paragraph);
            conflicts.push(conflict);
        }
    }

    conflicts
}

/// Drop repeats of the same unordered requirement pair. First occurrence wins.
pub fn dedup_conflicts(conflicts: Vec<ArchitecturalConflict>) -> Vec<ArchitecturalConflict> {
    let mut seen = HashSet::new();
    conflicts
        .into_iter()
        .filter(|c| {
            let a = normalize_text(&c.requirement1);
            let b = normalize_text(&c.requirement2);
            let key = if a <= b { (a, b) } else { (b, a) };
            seen.insert(key)
        })
        .collect()
}
