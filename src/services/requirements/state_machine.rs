//! Requirements Analysis State Machine
//!
//! Sequences analysis, detection, validation and clarification into one
//! flow per request and assembles the final [`EnrichedRequirements`].
//!
//! ```text
//! AnalyzingInitial ─┬─> CriticallyLow ──────────────────────────────> Complete
//!                   └─> FilteringByConfidence -> DetectingArchitecturalIssues
//!                       -> PresentingClarifications -> CollectingClarifications
//!                       -> Reanalyzing -> Finalizing -> Complete
//! ```
//!
//! Presentation, collection and re-analysis are skipped when their
//! preconditions do not hold. Nothing survives between runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use requirements_cascade_core::{InteractionCapabilities, UserInteraction};
use requirements_cascade_llm::LlmProvider;

use crate::models::{
    AnalysisSettings, AnalysisState, ArchitecturalConflict, EnrichedRequirements,
    RequirementsAnalysis, TechnicalChallenge,
};
use crate::utils::error::AppResult;

use super::analyzer::RequirementsAnalyzer;
use super::challenges::ChallengePredictor;
use super::confidence::ConfidenceEvaluator;
use super::conflicts::ConflictDetector;
use super::context_budget::{ContextBudgeter, ContextEnrichment};
use super::dedup::ClarificationDeduplicator;
use super::prompts::DetectionStrictness;
use super::relevance::RelevanceValidator;
use super::summary::{build_professional_summary, questions_from_issues};

/// Asked when confidence is too low to analyze anything
pub const ESSENTIAL_QUESTIONS: [&str; 5] = [
    "What is the main purpose of this product, and what problem does it solve?",
    "Who are the primary users?",
    "What are the core features it must have?",
    "Which technical stack or platforms should it use?",
    "What is the expected timeline?",
];

/// Recorded for an essential question left blank twice
pub const NOT_SPECIFIED: &str = "Not specified";

/// Asked when confidence is low but no specific question was produced
pub const GENERIC_CLARIFICATION: &str =
    "What else should we know about this product before writing its requirements?";

const OPT_IN_PROMPT: &str = "Would you like to answer these clarifying questions?";

/// Validated findings of one detection pass
#[derive(Debug, Clone)]
struct DetectionOutcome {
    conflicts: Vec<ArchitecturalConflict>,
    challenges: Vec<TechnicalChallenge>,
    relevance_score: f64,
}

/// Ordered record of visited states for one run
struct StateTrace {
    request_id: String,
    states: Vec<AnalysisState>,
}

impl StateTrace {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            states: Vec::new(),
        }
    }

    fn enter(&mut self, state: AnalysisState) {
        info!(request_id = %self.request_id, %state, "requirements analysis state");
        self.states.push(state);
    }
}

/// Drives one end-to-end analysis per call to [`run`](Self::run)
pub struct RequirementsStateMachine {
    provider: Arc<dyn LlmProvider>,
    interaction: Arc<dyn UserInteraction>,
    capabilities: InteractionCapabilities,
    settings: AnalysisSettings,
    analyzer: RequirementsAnalyzer,
    conflict_detector: ConflictDetector,
    challenge_predictor: ChallengePredictor,
    evaluator: ConfidenceEvaluator,
    validator: RelevanceValidator,
    deduplicator: ClarificationDeduplicator,
}

impl RequirementsStateMachine {
    /// Build the pipeline. Settings are validated here.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        interaction: Arc<dyn UserInteraction>,
        settings: AnalysisSettings,
        capabilities: InteractionCapabilities,
    ) -> AppResult<Self> {
        settings.validate()?;
        Ok(Self {
            analyzer: RequirementsAnalyzer::new(provider.clone(), settings.temperatures.analysis),
            conflict_detector: ConflictDetector::new(provider.clone(), &settings),
            challenge_predictor: ChallengePredictor::new(provider.clone(), &settings),
            evaluator: ConfidenceEvaluator::new(
                settings.thresholds.clone(),
                settings.confidence.clone(),
            ),
            validator: RelevanceValidator::new(settings.relevance.clone()),
            deduplicator: ClarificationDeduplicator::new(settings.dedup.clone()),
            provider,
            interaction,
            capabilities,
            settings,
        })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Analyze one product request.
    ///
    /// `request_id` is an optional external identifier; one is generated
    /// when absent. Service and interaction failures propagate; malformed
    /// or ungrounded model output never does.
    pub async fn run(
        &self,
        input: &str,
        request_id: Option<&str>,
    ) -> AppResult<EnrichedRequirements> {
        let request_id = request_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut trace = StateTrace::new(request_id);

        trace.enter(AnalysisState::AnalyzingInitial);
        self.interaction
            .show_progress("Analyzing requirements and technical stack...")
            .await?;

        let (requirements, stack, early) = tokio::join!(
            self.analyzer.analyze_requirements(input),
            self.analyzer.analyze_technical_stack(input),
            self.detect(input, DetectionStrictness::Standard),
        );
        let requirements = requirements?;
        let stack = stack?;

        if self.evaluator.is_non_viable(requirements.confidence) {
            return self
                .run_critically_low(trace, input, &stack, early)
                .await;
        }

        trace.enter(AnalysisState::FilteringByConfidence);
        let filtered_requirements = self.evaluator.filter_by_confidence(&requirements);
        let filtered_stack = self.evaluator.filter_by_confidence(&stack);

        trace.enter(AnalysisState::DetectingArchitecturalIssues);
        let mut outcome = self.validate_pass(input, early).await;
        self.report_detection(&outcome).await?;

        let candidates = self.clarification_candidates(
            &filtered_requirements,
            &filtered_stack,
            &outcome,
        );

        let answers = if !candidates.is_empty()
            || self.evaluator.needs_clarification(requirements.confidence)
        {
            trace.enter(AnalysisState::PresentingClarifications);
            self.present_and_collect(&mut trace, candidates).await?
        } else {
            Vec::new()
        };
        let clarifications_provided = !answers.is_empty();

        let enriched_input = if clarifications_provided {
            enrich_input(input, &answers)
        } else {
            input.to_string()
        };

        if clarifications_provided
            && (self.evaluator.needs_refinement(requirements.confidence)
                || self.evaluator.needs_refinement(stack.confidence))
        {
            trace.enter(AnalysisState::Reanalyzing);
            match self.analyzer.reanalyze(&enriched_input).await {
                Ok(reanalysis) => info!(
                    request_id = %trace.request_id,
                    confidence = reanalysis.confidence,
                    gaps = reanalysis.gaps.len(),
                    "reanalysis after clarifications"
                ),
                Err(e) => warn!(request_id = %trace.request_id, error = %e, "reanalysis failed"),
            }
        }

        if clarifications_provided {
            // The enriched text supersedes the early pass entirely
            trace.enter(AnalysisState::DetectingArchitecturalIssues);
            let fresh = self
                .detect(&enriched_input, DetectionStrictness::Standard)
                .await;
            outcome = self.validate_pass(&enriched_input, fresh).await;
            self.report_detection(&outcome).await?;
        }

        trace.enter(AnalysisState::Finalizing);
        let overall_confidence = self.evaluator.calculate_overall_confidence(
            requirements.confidence,
            stack.confidence,
            clarifications_provided,
        );
        let gaps = union(&filtered_requirements.gaps, &filtered_stack.gaps);
        let professional_analysis_summary = build_professional_summary(
            &self.evaluator,
            overall_confidence,
            &outcome.conflicts,
            &outcome.challenges,
            &gaps,
        );

        trace.enter(AnalysisState::Complete);
        self.interaction
            .show_progress(&format!(
                "Requirements analysis complete (confidence {}/100)",
                overall_confidence
            ))
            .await?;

        Ok(EnrichedRequirements {
            request_id: trace.request_id,
            original_input: input.to_string(),
            enriched_input,
            clarifications: answers.into_iter().collect(),
            assumptions: filtered_requirements.assumptions,
            gaps,
            overall_confidence,
            professional_analysis_summary,
            conflicts: outcome.conflicts,
            challenges: outcome.challenges,
            technical_stack_notes: filtered_stack.assumptions,
            relevance_score: outcome.relevance_score,
            state_trace: trace.states,
            analyzed_at: Utc::now(),
        })
    }

    /// Bounded context for one downstream document section
    pub fn section_context(&self, result: &EnrichedRequirements, section: &str) -> String {
        let budget = &self.settings.budget;
        let provider = self.provider.name();
        let token_ceiling = budget
            .provider_token_ceilings
            .get(provider)
            .copied()
            .unwrap_or_else(|| {
                budget
                    .default_token_ceiling
                    .min(self.provider.context_window() as usize)
            });

        let budgeter = ContextBudgeter::new(budget.clone());
        budgeter.build_context(
            section,
            &result.enriched_input,
            Some(&ContextEnrichment::from(result)),
            budgeter.char_budget(token_ceiling),
        )
    }

    /// Essential checklist, one reanalysis, then stop
    async fn run_critically_low(
        &self,
        mut trace: StateTrace,
        input: &str,
        stack: &RequirementsAnalysis,
        early: (Vec<ArchitecturalConflict>, Vec<TechnicalChallenge>),
    ) -> AppResult<EnrichedRequirements> {
        trace.enter(AnalysisState::CriticallyLow);
        self.interaction
            .show_warning(
                "The request is too brief to analyze. A few essential questions must be answered first.",
            )
            .await?;

        let mut answers = Vec::with_capacity(ESSENTIAL_QUESTIONS.len());
        for question in ESSENTIAL_QUESTIONS {
            let answer = self.ask_mandatory(question).await?;
            answers.push((question.to_string(), answer));
        }

        let enriched_input = enrich_input(input, &answers);
        let reanalysis = self.analyzer.reanalyze(&enriched_input).await?;

        let (raw_conflicts, raw_challenges) = early;
        let relevance_score =
            self.validator
                .calculate_relevance_score(&raw_conflicts, &raw_challenges, input);
        let conflicts = self.validator.validate_conflicts(&raw_conflicts, input);
        let challenges = self.validator.validate_challenges(&raw_challenges, input);

        let overall_confidence =
            self.evaluator
                .calculate_overall_confidence(reanalysis.confidence, stack.confidence, true);
        let professional_analysis_summary = build_professional_summary(
            &self.evaluator,
            overall_confidence,
            &conflicts,
            &challenges,
            &reanalysis.gaps,
        );

        trace.enter(AnalysisState::Complete);
        Ok(EnrichedRequirements {
            request_id: trace.request_id,
            original_input: input.to_string(),
            enriched_input,
            clarifications: answers.into_iter().collect::<BTreeMap<_, _>>(),
            assumptions: reanalysis.assumptions,
            gaps: reanalysis.gaps,
            overall_confidence,
            professional_analysis_summary,
            conflicts,
            challenges,
            technical_stack_notes: self.evaluator.filter_by_confidence(stack).assumptions,
            relevance_score,
            state_trace: trace.states,
            analyzed_at: Utc::now(),
        })
    }

    /// Ask once, retry once on a blank answer, else record "Not specified"
    async fn ask_mandatory(&self, question: &str) -> AppResult<String> {
        for attempt in 0..2 {
            let answer = self.interaction.ask_question(question).await?;
            let answer = answer.trim();
            if !answer.is_empty() {
                return Ok(answer.to_string());
            }
            if attempt == 0 {
                self.interaction
                    .show_warning("An answer is required to continue.")
                    .await?;
            }
        }
        warn!(question, "essential question left unanswered");
        Ok(NOT_SPECIFIED.to_string())
    }

    /// Concurrent conflict + challenge detection
    async fn detect(
        &self,
        text: &str,
        strictness: DetectionStrictness,
    ) -> (Vec<ArchitecturalConflict>, Vec<TechnicalChallenge>) {
        tokio::join!(
            self.conflict_detector.detect(text, strictness),
            self.challenge_predictor.predict(text, strictness),
        )
    }

    /// Score a raw pass, re-run strictly when it falls below the floor,
    /// then keep only traceable findings
    async fn validate_pass(
        &self,
        source: &str,
        raw: (Vec<ArchitecturalConflict>, Vec<TechnicalChallenge>),
    ) -> DetectionOutcome {
        let (mut conflicts, mut challenges) = raw;
        let mut relevance_score =
            self.validator
                .calculate_relevance_score(&conflicts, &challenges, source);

        if self.validator.below_floor(relevance_score) {
            warn!(
                relevance_score,
                "detection pass mostly ungrounded; re-running with strict prompt"
            );
            let (strict_conflicts, strict_challenges) =
                self.detect(source, DetectionStrictness::Strict).await;
            conflicts = strict_conflicts;
            challenges = strict_challenges;
            relevance_score =
                self.validator
                    .calculate_relevance_score(&conflicts, &challenges, source);
        }

        self.validator
            .detect_generic_issues(&conflicts, &challenges, source);

        DetectionOutcome {
            conflicts: self.validator.validate_conflicts(&conflicts, source),
            challenges: self.validator.validate_challenges(&challenges, source),
            relevance_score,
        }
    }

    async fn report_detection(&self, outcome: &DetectionOutcome) -> AppResult<()> {
        tracing::debug!(
            conflicts = outcome.conflicts.len(),
            challenges = outcome.challenges.len(),
            relevance_score = outcome.relevance_score,
            "detection pass validated"
        );
        if self.capabilities.rich_progress {
            self.interaction
                .show_progress(&format!(
                    "Validated {} conflict(s) and {} challenge(s) (relevance {:.2})",
                    outcome.conflicts.len(),
                    outcome.challenges.len(),
                    outcome.relevance_score
                ))
                .await?;
        }
        Ok(())
    }

    /// Requirements questions first, then stack, then issue-derived ones
    fn clarification_candidates(
        &self,
        requirements: &RequirementsAnalysis,
        stack: &RequirementsAnalysis,
        outcome: &DetectionOutcome,
    ) -> Vec<String> {
        let analysis_questions = self.deduplicator.merge(
            &requirements.clarifications_needed,
            &stack.clarifications_needed,
        );
        let issue_questions = questions_from_issues(&outcome.conflicts, &outcome.challenges);
        self.deduplicator.merge(&analysis_questions, &issue_questions)
    }

    /// Show the candidates, ask for opt-in, collect non-empty answers
    async fn present_and_collect(
        &self,
        trace: &mut StateTrace,
        candidates: Vec<String>,
    ) -> AppResult<Vec<(String, String)>> {
        let questions = if candidates.is_empty() {
            vec![GENERIC_CLARIFICATION.to_string()]
        } else {
            candidates
        };

        let listing = questions
            .iter()
            .enumerate()
            .map(|(i, q)| format!("{}. {}", i + 1, q))
            .collect::<Vec<_>>()
            .join("\n");
        self.interaction
            .show_info(&format!("Clarifying questions:\n{}", listing))
            .await?;

        if !self.interaction.ask_yes_no(OPT_IN_PROMPT).await? {
            info!(request_id = %trace.request_id, "clarifications declined");
            return Ok(Vec::new());
        }

        trace.enter(AnalysisState::CollectingClarifications);
        let mut answers = Vec::new();
        for question in questions {
            let answer = self.interaction.ask_question(&question).await?;
            let answer = answer.trim();
            if !answer.is_empty() {
                answers.push((question, answer.to_string()));
            }
        }
        Ok(self.deduplicator.dedupe_answers(answers))
    }
}

/// Append answered clarifications to the request text, one bullet per
/// answer. The answer leads so statement truncation drops the question first.
pub fn enrich_input(input: &str, answers: &[(String, String)]) -> String {
    let mut enriched = input.trim_end().to_string();
    if answers.is_empty() {
        return enriched;
    }
    enriched.push_str("\n\n## Clarifications\n");
    for (question, answer) in answers {
        enriched.push_str(&format!("- {} (asked: {})\n", answer, question));
    }
    enriched.trim_end().to_string()
}

/// Order-preserving union without exact repeats
fn union(first: &[String], second: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(first.len() + second.len());
    for item in first.iter().chain(second) {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}
