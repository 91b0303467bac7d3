//! Context Budget Integration Tests
//!
//! Section context built from a finished analysis must fit the ceiling of
//! the provider that will consume it.

use std::sync::Arc;

use requirements_cascade::services::requirements::{NO_CHALLENGES_MARKER, NO_CONFLICTS_MARKER};
use requirements_cascade::{
    AnalysisSettings, ContextBudgeter, ContextEnrichment, EnrichedRequirements,
    InteractionCapabilities, RequirementsStateMachine, ScriptedInteraction,
};

use crate::support::*;

fn long_request() -> String {
    "Teachers create quizzes and students answer them from any browser. ".repeat(2_000)
}

fn stub(name: &'static str) -> RoutedProvider {
    RoutedProvider::new(name)
        .route(REQUIREMENTS_PROMPT, &[&analysis_json(90, &[], &[])])
        .route(
            STACK_PROMPT,
            &[&analysis_json(80, &[], &["Rust backend on Fly.io"])],
        )
        .route(CONFLICT_PROMPT, &[NO_CONFLICTS_MARKER])
        .route(CHALLENGE_PROMPT, &[NO_CHALLENGES_MARKER])
}

async fn analyze(provider: Arc<RoutedProvider>) -> (RequirementsStateMachine, EnrichedRequirements) {
    let machine = RequirementsStateMachine::new(
        provider,
        Arc::new(ScriptedInteraction::default()),
        AnalysisSettings::default(),
        InteractionCapabilities::default(),
    )
    .unwrap();
    let result = machine.run(&long_request(), None).await.unwrap();
    (machine, result)
}

#[tokio::test]
async fn test_section_context_uses_provider_ceiling() {
    let (machine, result) = analyze(Arc::new(stub("ollama"))).await;

    // 2,000 tokens at 4 characters each
    let context = machine.section_context(&result, "Architecture");
    assert!(context.chars().count() <= 8_000);
    assert!(context.starts_with("## Core Request\n"));
    assert!(context.contains("## Technical Stack\n- Rust backend on Fly.io"));
}

#[tokio::test]
async fn test_section_context_respects_small_context_window() {
    let provider = Arc::new(stub("stub").with_context_window(500));
    let (machine, result) = analyze(provider).await;

    // Unknown provider: min(default ceiling, context window) tokens
    let context = machine.section_context(&result, "Overview");
    assert!(context.chars().count() <= 2_000);
    assert!(!context.contains("## Technical Stack"));
}

#[tokio::test]
async fn test_budgeter_over_finished_analysis() {
    let (_, result) = analyze(Arc::new(stub("anthropic"))).await;
    let budgeter = ContextBudgeter::default();
    let enrichment = ContextEnrichment::from(&result);

    for section in ["Overview", "Data Model", "Deployment", "Timeline"] {
        let context =
            budgeter.build_for_provider("openai", section, &result.enriched_input, Some(&enrichment));
        assert!(context.chars().count() <= 24_000, "section {}", section);
    }

    let tiny = budgeter.build_context("Deployment", &result.enriched_input, Some(&enrichment), 10);
    assert!(tiny.chars().count() <= 10);
}
