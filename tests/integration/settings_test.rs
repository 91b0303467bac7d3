//! Settings Integration Tests
//!
//! TOML settings files loaded from disk and applied to a full run.

use std::io::Write;
use std::sync::Arc;

use requirements_cascade::services::requirements::{
    GENERIC_CLARIFICATION, NO_CHALLENGES_MARKER, NO_CONFLICTS_MARKER,
};
use requirements_cascade::{
    AnalysisSettings, AnalysisState, AppError, InteractionCapabilities,
    RequirementsStateMachine, ScriptedInteraction,
};

use crate::support::*;

fn write_settings(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_custom_thresholds_change_the_path() {
    let file = write_settings(
        r#"
[thresholds]
non_viable = 30

[confidence]
clarification_bonus = 10

[budget]
default_token_ceiling = 100
"#,
    );
    let settings = AnalysisSettings::load(file.path()).unwrap();
    assert_eq!(settings.thresholds.non_viable, 30);
    assert_eq!(settings.thresholds.needs_refinement, 60);
    assert_eq!(settings.budget.token_ceiling_for("ollama"), 2_000);

    let provider = Arc::new(
        RoutedProvider::new("stub")
            .route(REANALYSIS_PROMPT, &[&analysis_json(70, &[], &[])])
            .route(REQUIREMENTS_PROMPT, &[&analysis_json(35, &[], &[])])
            .route(STACK_PROMPT, &[&analysis_json(80, &[], &[])])
            .route(CONFLICT_PROMPT, &[NO_CONFLICTS_MARKER])
            .route(CHALLENGE_PROMPT, &[NO_CHALLENGES_MARKER]),
    );
    let ui = Arc::new(ScriptedInteraction::new(["Teachers and students"], vec![true]));
    let machine = RequirementsStateMachine::new(
        provider.clone(),
        ui.clone(),
        settings,
        InteractionCapabilities::default(),
    )
    .unwrap();

    let result = machine.run("A quiz platform", None).await.unwrap();

    // 35 would be critically low under the default threshold of 40
    assert!(!result.visited(AnalysisState::CriticallyLow));
    assert!(result.visited(AnalysisState::Reanalyzing));
    assert_eq!(ui.questions_asked(), vec![GENERIC_CLARIFICATION]);
    assert_eq!(provider.calls_to(REANALYSIS_PROMPT).len(), 1);

    // round((35 + 80) / 2) + 10
    assert_eq!(result.overall_confidence, 68);

    // 100 tokens at 4 characters each
    let context = machine.section_context(&result, "Overview");
    assert!(context.chars().count() <= 400);
    assert!(context.contains("Teachers and students"));
}

#[test]
fn test_invalid_settings_file_is_rejected() {
    let file = write_settings(
        r#"
[thresholds]
non_viable = 80
needs_refinement = 60
"#,
    );
    let err = AnalysisSettings::load(file.path()).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn test_malformed_settings_file_is_a_parse_error() {
    let file = write_settings("[thresholds\nnon_viable = ");
    let err = AnalysisSettings::load(file.path()).unwrap_err();
    assert!(matches!(err, AppError::SettingsParse(_)));
}

#[test]
fn test_missing_settings_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AnalysisSettings::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, AppError::Io(_)));
}
