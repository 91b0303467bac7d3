//! Requirements Pipeline Integration Tests
//!
//! Drives `RequirementsStateMachine::run` end to end with a routed provider
//! stub and a scripted interaction surface:
//! - Critically-low requests go through the essential checklist only
//! - Clarifications are presented, collected, deduplicated and folded back in
//! - Ungrounded detection passes are retried strictly
//! - Service failures propagate, malformed output degrades to neutral defaults

use std::sync::Arc;

use requirements_cascade::models::{AnalysisState, ConflictType};
use requirements_cascade::services::requirements::{
    ESSENTIAL_QUESTIONS, GENERIC_CLARIFICATION, NO_CHALLENGES_MARKER, NO_CONFLICTS_MARKER,
};
use requirements_cascade::{
    AnalysisSettings, InteractionCapabilities, RequirementsStateMachine, ScriptedInteraction,
};
use requirements_cascade_core::InteractionEvent;

use crate::support::*;

// ============================================================================
// Helpers
// ============================================================================

const FIELD_NOTES_REQUEST: &str = "Collaborative notes app for field teams.
- Users must be able to edit documents offline
- All edits must sync in real-time across devices
- Export notes as PDF";

fn offline_sync_conflicts() -> String {
    serde_json::json!({
        "conflicts": [
            {
                "requirement1": "Users must be able to edit documents offline",
                "requirement2": "All edits must sync in real-time across devices",
                "conflictType": "realtimeVsOffline",
                "severity": "high",
                "resolution": {
                    "approach": "Local-first storage with a sync queue",
                    "tradeoffs": ["Merge conflicts on reconnect"],
                    "recommendation": "Queue offline edits and reconcile on reconnect"
                }
            },
            {
                "requirement1": "Requirement A",
                "requirement2": "Requirement B",
                "conflictType": "mutuallyExclusive",
                "severity": "low"
            }
        ]
    })
    .to_string()
}

fn offline_merge_challenge() -> String {
    serde_json::json!({
        "challenges": [
            {
                "title": "Offline merge conflicts",
                "description": "Edits made offline on several devices must be merged",
                "priority": "high",
                "relatedRequirement": "Users must be able to edit documents offline"
            }
        ]
    })
    .to_string()
}

fn nothing_detected() -> RoutedProvider {
    RoutedProvider::new("anthropic")
        .route(CONFLICT_PROMPT, &[NO_CONFLICTS_MARKER])
        .route(CHALLENGE_PROMPT, &[NO_CHALLENGES_MARKER])
}

fn machine(
    provider: Arc<RoutedProvider>,
    ui: Arc<ScriptedInteraction>,
    capabilities: InteractionCapabilities,
) -> RequirementsStateMachine {
    RequirementsStateMachine::new(provider, ui, AnalysisSettings::default(), capabilities).unwrap()
}

// ============================================================================
// Critically-low path
// ============================================================================

#[tokio::test]
async fn test_critically_low_request_uses_essential_checklist() {
    let provider = Arc::new(
        RoutedProvider::new("anthropic")
            .route(REQUIREMENTS_PROMPT, &[&analysis_json(25, &["Anything?"], &[])])
            .route(
                STACK_PROMPT,
                &[&analysis_json(45, &[], &["Web frontend", "Probably hosted on AWS"])],
            )
            .route(REANALYSIS_PROMPT, &[&analysis_json(60, &[], &[])])
            .route(
                CONFLICT_PROMPT,
                &[r#"{"conflicts": [{"requirement1": "Feature X", "requirement2": "Feature Y"}]}"#],
            )
            .route(CHALLENGE_PROMPT, &[NO_CHALLENGES_MARKER]),
    );
    let ui = Arc::new(ScriptedInteraction::new(
        [
            "Shared grocery lists",
            "Families",
            "Lists, sharing, reminders",
            "Flutter and Firebase",
            "Three months",
        ],
        vec![],
    ));

    let result = machine(provider.clone(), ui.clone(), InteractionCapabilities::default())
        .run("An app.", None)
        .await
        .unwrap();

    assert_eq!(
        result.state_trace,
        vec![
            AnalysisState::AnalyzingInitial,
            AnalysisState::CriticallyLow,
            AnalysisState::Complete,
        ]
    );
    assert!(!result.visited(AnalysisState::PresentingClarifications));
    assert_eq!(ui.questions_asked(), ESSENTIAL_QUESTIONS.to_vec());
    assert!(!ui
        .transcript()
        .iter()
        .any(|e| matches!(e, InteractionEvent::YesNo(_))));

    assert_eq!(result.clarifications.len(), 5);
    assert!(result.enriched_input.starts_with("An app.\n\n## Clarifications\n"));
    assert!(result
        .enriched_input
        .contains("- Flutter and Firebase (asked: "));
    assert_eq!(provider.calls_to(REANALYSIS_PROMPT).len(), 1);

    // Placeholder conflict never survives
    assert!(result.conflicts.is_empty());
    assert_eq!(result.relevance_score, 0.0);

    // round((60 + 45) / 2) + 15
    assert_eq!(result.overall_confidence, 68);
    assert_eq!(result.technical_stack_notes, vec!["Web frontend"]);
    assert!(!result.request_id.is_empty());
}

// ============================================================================
// Standard path with clarifications
// ============================================================================

#[tokio::test]
async fn test_clarifications_enrich_and_redetect() {
    let conflicts = offline_sync_conflicts();
    let challenges = offline_merge_challenge();
    let provider = Arc::new(
        RoutedProvider::new("anthropic")
            .route(REANALYSIS_PROMPT, &[&analysis_json(80, &[], &[])])
            .route(
                REQUIREMENTS_PROMPT,
                &[&analysis_json(
                    62,
                    &["What database should we use?", "Who are the target users?"],
                    &[],
                )],
            )
            .route(
                STACK_PROMPT,
                &[&analysis_json(
                    50,
                    &["Which DB to pick?"],
                    &["Probably a mobile app", "Native iOS and Android clients"],
                )],
            )
            .route(CONFLICT_PROMPT, &[&conflicts])
            .route(CHALLENGE_PROMPT, &[&challenges]),
    );
    let ui = Arc::new(ScriptedInteraction::new(
        ["Postgres", "Field technicians", "Offline editing wins", ""],
        vec![true],
    ));

    let result = machine(provider.clone(), ui.clone(), InteractionCapabilities::default())
        .run(FIELD_NOTES_REQUEST, Some("req-42"))
        .await
        .unwrap();

    assert_eq!(result.request_id, "req-42");
    assert_eq!(
        result.state_trace,
        vec![
            AnalysisState::AnalyzingInitial,
            AnalysisState::FilteringByConfidence,
            AnalysisState::DetectingArchitecturalIssues,
            AnalysisState::PresentingClarifications,
            AnalysisState::CollectingClarifications,
            AnalysisState::Reanalyzing,
            AnalysisState::DetectingArchitecturalIssues,
            AnalysisState::Finalizing,
            AnalysisState::Complete,
        ]
    );

    // "Which DB to pick?" merged into "What database should we use?"
    let asked = ui.questions_asked();
    assert_eq!(asked.len(), 4);
    assert_eq!(asked[0], "What database should we use?");
    assert_eq!(asked[1], "Who are the target users?");
    assert!(asked[2].contains("Which should take priority?"));
    assert_eq!(asked[3], "How should we approach Offline merge conflicts?");
    assert!(!asked.iter().any(|q| q == "Which DB to pick?"));

    // Blank answer dropped
    assert_eq!(result.clarifications.len(), 3);
    assert_eq!(
        result.clarifications.get("What database should we use?").map(String::as_str),
        Some("Postgres")
    );
    assert!(result
        .enriched_input
        .contains("- Field technicians (asked: Who are the target users?)"));

    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].conflict_type, ConflictType::RealtimeVsOffline);
    assert_eq!(result.challenges.len(), 1);
    // Placeholder conflict rejected: two of three findings grounded
    assert!((result.relevance_score - 2.0 / 3.0).abs() < 1e-9);

    // Four statements in batches of three, plus the critical pass
    let conflict_calls = provider.calls_to(CONFLICT_PROMPT);
    assert!(conflict_calls
        .iter()
        .any(|c| c.user.starts_with("Critical requirement statements")));
    assert!(conflict_calls.len() >= 6);

    // Re-detection sees every collected answer
    for answer in ["Postgres", "Field technicians", "Offline editing wins"] {
        assert!(
            conflict_calls.iter().any(|c| c.user.contains(answer)),
            "answer not re-detected: {}",
            answer
        );
        assert!(provider
            .calls_to(CHALLENGE_PROMPT)
            .iter()
            .any(|c| c.user.contains(answer)));
    }

    // round((62 + 50) / 2) + 15
    assert_eq!(result.overall_confidence, 71);
    assert_eq!(result.technical_stack_notes, vec!["Native iOS and Android clients"]);

    let summary = result.professional_analysis_summary.unwrap();
    assert!(summary.contains("### Architectural Conflicts (1)"));
    assert!(summary.contains("[HIGH]"));
}

#[tokio::test]
async fn test_trailing_period_questions_asked_once() {
    let provider = Arc::new(
        nothing_detected()
            .route(
                REQUIREMENTS_PROMPT,
                &[&analysis_json(65, &["Must support offline editing"], &[])],
            )
            .route(
                STACK_PROMPT,
                &[&analysis_json(75, &["Must support offline editing."], &[])],
            ),
    );
    let ui = Arc::new(ScriptedInteraction::new(["Yes"], vec![true]));

    let result = machine(provider.clone(), ui.clone(), InteractionCapabilities::default())
        .run("- Note taking for hikers\n- Map overlays", None)
        .await
        .unwrap();

    assert_eq!(ui.questions_asked(), vec!["Must support offline editing"]);
    assert_eq!(result.clarifications.len(), 1);
    // Both scores clear the refinement threshold
    assert!(!result.visited(AnalysisState::Reanalyzing));
    assert!(provider.calls_to(REANALYSIS_PROMPT).is_empty());
    assert_eq!(result.overall_confidence, 85);
}

#[tokio::test]
async fn test_declined_clarifications_keep_original_input() {
    let provider = Arc::new(
        nothing_detected()
            .route(REQUIREMENTS_PROMPT, &[&analysis_json(55, &["Who pays?"], &[])])
            .route(STACK_PROMPT, &[&analysis_json(70, &[], &[])]),
    );
    let ui = Arc::new(ScriptedInteraction::new(Vec::<String>::new(), vec![false]));

    let result = machine(provider, ui.clone(), InteractionCapabilities::default())
        .run("A subscription box service", None)
        .await
        .unwrap();

    assert!(result.visited(AnalysisState::PresentingClarifications));
    assert!(!result.visited(AnalysisState::CollectingClarifications));
    assert!(ui.questions_asked().is_empty());
    assert_eq!(result.enriched_input, "A subscription box service");
    assert!(result.clarifications.is_empty());
    // round((55 + 70) / 2), no bonus
    assert_eq!(result.overall_confidence, 63);
}

// ============================================================================
// Detection retries
// ============================================================================

#[tokio::test]
async fn test_ungrounded_pass_is_retried_strictly() {
    let placeholder =
        r#"{"conflicts": [{"requirement1": "Requirement A", "requirement2": "Requirement B"}]}"#;
    let both_markers = format!("{} {}", NO_CONFLICTS_MARKER, NO_CHALLENGES_MARKER);
    let provider = Arc::new(
        RoutedProvider::new("anthropic")
            .route(STRICT_PROMPT, &[&both_markers])
            .route(CONFLICT_PROMPT, &[placeholder])
            .route(CHALLENGE_PROMPT, &[NO_CHALLENGES_MARKER])
            .route(REQUIREMENTS_PROMPT, &[&analysis_json(90, &[], &[])])
            .route(STACK_PROMPT, &[&analysis_json(90, &[], &[])]),
    );
    let ui = Arc::new(ScriptedInteraction::default());

    let result = machine(provider.clone(), ui.clone(), InteractionCapabilities::rich())
        .run("Build a note-taking app that works offline.", None)
        .await
        .unwrap();

    assert_eq!(
        result.state_trace,
        vec![
            AnalysisState::AnalyzingInitial,
            AnalysisState::FilteringByConfidence,
            AnalysisState::DetectingArchitecturalIssues,
            AnalysisState::Finalizing,
            AnalysisState::Complete,
        ]
    );
    assert!(result.conflicts.is_empty());
    assert_eq!(result.relevance_score, 1.0);
    assert_eq!(result.overall_confidence, 90);
    assert!(result.professional_analysis_summary.is_none());

    let strict_calls = provider.calls_to(STRICT_PROMPT);
    assert_eq!(strict_calls.len(), 2);
    assert!(strict_calls.iter().all(|c| c.temperature == Some(0.1)));

    assert!(ui.transcript().contains(&InteractionEvent::Progress(
        "Validated 0 conflict(s) and 0 challenge(s) (relevance 1.00)".to_string()
    )));
}

// ============================================================================
// Failures and malformed output
// ============================================================================

#[tokio::test]
async fn test_service_failure_propagates() {
    let provider = Arc::new(nothing_detected().failing(REQUIREMENTS_PROMPT));
    let ui = Arc::new(ScriptedInteraction::default());

    let err = machine(provider, ui.clone(), InteractionCapabilities::default())
        .run("A booking system for climbing gyms", None)
        .await
        .unwrap_err();

    assert!(err.is_service_failure());
    assert!(ui.questions_asked().is_empty());
}

#[tokio::test]
async fn test_malformed_analysis_falls_back_to_neutral() {
    let provider = Arc::new(
        nothing_detected()
            .route(REQUIREMENTS_PROMPT, &["I would rather describe this in prose."])
            .route(STACK_PROMPT, &["```json\n{ not json at all\n```"]),
    );
    let ui = Arc::new(ScriptedInteraction::default());

    let result = machine(provider, ui.clone(), InteractionCapabilities::default())
        .run("A booking system for climbing gyms", None)
        .await
        .unwrap();

    // Neutral 50 is below the clarification threshold, so the generic
    // question is offered
    assert_eq!(result.overall_confidence, 50);
    assert!(ui
        .transcript()
        .iter()
        .any(|e| matches!(e, InteractionEvent::Info(text) if text.contains(GENERIC_CLARIFICATION))));
}
