//! Context Budgeter
//!
//! Assembles the bounded prompt context handed to per-section generation:
//! a core-request excerpt, the clarifications relevant to the section, and
//! stack facts for stack-relevant sections. Output never exceeds the
//! character budget derived from the provider's token ceiling.

use std::collections::BTreeMap;

use crate::models::{BudgetSettings, EnrichedRequirements};

use super::text::truncate_chars;

/// Appended when the assembled context had to be cut
pub const TRUNCATION_MARKER: &str = "\n[...context truncated]";

/// Clarifications used when none match the section vocabulary
const FALLBACK_CLARIFICATIONS: usize = 2;

/// (section name fragment, vocabulary, stack-relevant)
const SECTION_KEYWORDS: &[(&str, &[&str], bool)] = &[
    (
        "overview",
        &["purpose", "goal", "problem", "audience", "users", "vision"],
        false,
    ),
    (
        "summary",
        &["purpose", "goal", "problem", "audience", "users", "vision"],
        false,
    ),
    (
        "feature",
        &["feature", "function", "workflow", "capabilit", "must", "should"],
        false,
    ),
    (
        "user",
        &["user", "persona", "role", "customer", "audience", "accessib"],
        false,
    ),
    (
        "architecture",
        &["architecture", "service", "backend", "frontend", "api", "integration", "sync"],
        true,
    ),
    (
        "data",
        &["data", "database", "storage", "schema", "model", "retention"],
        true,
    ),
    (
        "security",
        &["security", "auth", "encrypt", "privacy", "compliance", "gdpr", "permission"],
        true,
    ),
    (
        "deploy",
        &["deploy", "hosting", "cloud", "infrastructure", "server", "platform"],
        true,
    ),
    (
        "performance",
        &["performance", "latency", "scale", "load", "concurrent", "speed"],
        true,
    ),
    (
        "integration",
        &["integration", "api", "third-party", "webhook", "import", "export"],
        true,
    ),
    (
        "timeline",
        &["timeline", "deadline", "milestone", "launch", "budget", "phase"],
        false,
    ),
    (
        "test",
        &["test", "quality", "acceptance", "validation"],
        false,
    ),
];

/// Structured enrichment available to the budgeter
#[derive(Debug, Clone, Default)]
pub struct ContextEnrichment {
    pub clarifications: BTreeMap<String, String>,
    pub stack_facts: Vec<String>,
}

impl From<&EnrichedRequirements> for ContextEnrichment {
    fn from(requirements: &EnrichedRequirements) -> Self {
        Self {
            clarifications: requirements.clarifications.clone(),
            stack_facts: requirements.technical_stack_notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextBudgeter {
    settings: BudgetSettings,
}

impl ContextBudgeter {
    pub fn new(settings: BudgetSettings) -> Self {
        Self { settings }
    }

    /// Character budget for a token ceiling
    pub fn char_budget(&self, token_ceiling: usize) -> usize {
        token_ceiling.saturating_mul(self.settings.chars_per_token)
    }

    /// Character budget for a provider, by name
    pub fn budget_for_provider(&self, provider: &str) -> usize {
        self.char_budget(self.settings.token_ceiling_for(provider))
    }

    /// Build section context sized to `provider`'s configured ceiling
    pub fn build_for_provider(
        &self,
        provider: &str,
        section: &str,
        working_input: &str,
        enrichment: Option<&ContextEnrichment>,
    ) -> String {
        self.build_context(
            section,
            working_input,
            enrichment,
            self.budget_for_provider(provider),
        )
    }

    /// Assemble context for `section` within `budget` characters
    pub fn build_context(
        &self,
        section: &str,
        working_input: &str,
        enrichment: Option<&ContextEnrichment>,
        budget: usize,
    ) -> String {
        let section_lower = section.to_lowercase();
        let matched: Vec<&(&str, &[&str], bool)> = SECTION_KEYWORDS
            .iter()
            .filter(|(fragment, _, _)| section_lower.contains(fragment))
            .collect();
        let stack_relevant = matched.iter().any(|(_, _, stack)| *stack);

        let mut context = String::from("## Core Request\n");
        context.push_str(&truncate_chars(working_input.trim(), budget / 3));

        if let Some(enrichment) = enrichment {
            let clarifications = select_clarifications(&enrichment.clarifications, &matched);
            if !clarifications.is_empty() {
                context.push_str("\n\n## Relevant Clarifications\n");
                for (question, answer) in clarifications {
                    context.push_str(&format!("- Q: {}\n  A: {}\n", question, answer));
                }
            }

            if stack_relevant && !enrichment.stack_facts.is_empty() {
                context.push_str("\n\n## Technical Stack\n");
                for fact in &enrichment.stack_facts {
                    context.push_str(&format!("- {}\n", fact));
                }
            }
        }

        let context = context.trim_end().to_string();
        let length = context.chars().count();
        if length <= budget {
            return context;
        }

        tracing::debug!(section, length, budget, "truncating section context");
        let marker_len = TRUNCATION_MARKER.chars().count();
        if budget < marker_len {
            return truncate_chars(&context, budget);
        }
        let mut truncated = truncate_chars(&context, budget - marker_len);
        truncated.push_str(TRUNCATION_MARKER);
        truncated
    }
}

/// Clarifications whose question or answer mentions the section vocabulary;
/// the first few when nothing matches
fn select_clarifications<'a>(
    clarifications: &'a BTreeMap<String, String>,
    matched: &[&(&str, &[&str], bool)],
) -> Vec<(&'a String, &'a String)> {
    let relevant: Vec<(&String, &String)> = clarifications
        .iter()
        .filter(|(question, answer)| {
            let text = format!("{} {}", question, answer).to_lowercase();
            matched
                .iter()
                .flat_map(|(_, keywords, _)| keywords.iter())
                .any(|k| text.contains(k))
        })
        .collect();

    if relevant.is_empty() {
        clarifications.iter().take(FALLBACK_CLARIFICATIONS).collect()
    } else {
        relevant
    }
}
