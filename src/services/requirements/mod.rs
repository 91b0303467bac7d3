//! Requirements Analysis Service
//!
//! Turns a free-text product request into validated, enriched requirements:
//! - Requirements and technical-stack confidence analysis
//! - Chunked, parallel conflict detection and challenge prediction
//! - Relevance validation of every finding against the source text
//! - Interactive clarification with near-duplicate suppression
//! - Budgeted per-section prompt context for downstream generation

pub mod analyzer;
pub mod challenges;
pub mod confidence;
pub mod conflicts;
pub mod context_budget;
pub mod dedup;
pub mod fanout;
pub mod prompts;
pub mod relevance;
pub mod state_machine;
pub mod statements;
pub mod structured;
pub mod summary;
pub mod text;

#[cfg(test)]
mod testing;

pub use analyzer::RequirementsAnalyzer;
pub use challenges::ChallengePredictor;
pub use confidence::{ConfidenceBand, ConfidenceEvaluator};
pub use conflicts::ConflictDetector;
pub use context_budget::{ContextBudgeter, ContextEnrichment, TRUNCATION_MARKER};
pub use dedup::ClarificationDeduplicator;
pub use prompts::{DetectionStrictness, NO_CHALLENGES_MARKER, NO_CONFLICTS_MARKER};
pub use relevance::{FindingKind, GenericIssue, RelevanceValidator};
pub use state_machine::{
    enrich_input, RequirementsStateMachine, ESSENTIAL_QUESTIONS, GENERIC_CLARIFICATION,
    NOT_SPECIFIED,
};
pub use statements::{extract_statements, DetectionPlan};
pub use structured::ParsedResponse;
