//! Analysis Summary
//!
//! Deterministic markdown digest of a finished analysis, plus the
//! clarifying questions derived from validated findings.

use crate::models::{ArchitecturalConflict, TechnicalChallenge};

use super::confidence::ConfidenceEvaluator;

/// One prioritisation question per conflict, one approach question per
/// high or critical challenge
pub fn questions_from_issues(
    conflicts: &[ArchitecturalConflict],
    challenges: &[TechnicalChallenge],
) -> Vec<String> {
    let conflict_questions = conflicts.iter().map(|c| {
        format!(
            "\"{}\" and \"{}\" pull in different directions. Which should take priority?",
            c.requirement1, c.requirement2
        )
    });
    let challenge_questions = challenges
        .iter()
        .filter(|c| c.priority.is_urgent())
        .map(|c| format!("How should we approach {}?", c.title.trim_end_matches('.')));

    conflict_questions.chain(challenge_questions).collect()
}

/// Markdown summary, or `None` when there is nothing beyond the score to report
pub fn build_professional_summary(
    evaluator: &ConfidenceEvaluator,
    overall_confidence: u8,
    conflicts: &[ArchitecturalConflict],
    challenges: &[TechnicalChallenge],
    gaps: &[String],
) -> Option<String> {
    if conflicts.is_empty() && challenges.is_empty() && gaps.is_empty() {
        return None;
    }

    let mut out = String::from("## Requirements Analysis Summary\n\n");
    out.push_str(&format!(
        "**Overall confidence:** {}/100 ({})\n",
        overall_confidence,
        evaluator.band(overall_confidence).label()
    ));

    if !conflicts.is_empty() {
        let mut sorted: Vec<&ArchitecturalConflict> = conflicts.iter().collect();
        sorted.sort_by(|a, b| b.severity.cmp(&a.severity));

        out.push_str(&format!("\n### Architectural Conflicts ({})\n", conflicts.len()));
        for c in sorted {
            out.push_str(&format!(
                "- [{}] \"{}\" vs \"{}\" ({})",
                c.severity.as_str().to_uppercase(),
                c.requirement1,
                c.requirement2,
                c.conflict_type
            ));
            if !c.resolution.recommendation.is_empty() {
                out.push_str(&format!(". Recommendation: {}", c.resolution.recommendation));
            }
            out.push('\n');
        }
    }

    if !challenges.is_empty() {
        let mut sorted: Vec<&TechnicalChallenge> = challenges.iter().collect();
        sorted.sort_by(|a, b| b.priority.cmp(&a.priority));

        out.push_str(&format!("\n### Technical Challenges ({})\n", challenges.len()));
        for c in sorted {
            out.push_str(&format!(
                "- [{}] {}: {}\n",
                c.priority.as_str().to_uppercase(),
                c.title,
                c.description
            ));
        }
    }

    if !gaps.is_empty() {
        out.push_str("\n### Open Gaps\n");
        for gap in gaps {
            out.push_str(&format!("- {}\n", gap));
        }
    }

    Some(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Severity};

    #[test]
    fn test_questions_from_issues() {
        let conflicts = vec![ArchitecturalConflict::between("Works offline", "Live sync")];
        let mut urgent = TechnicalChallenge::new("Offline merge.", "x");
        urgent.priority = Priority::Critical;
        let minor = TechnicalChallenge::new("Icon set", "y");

        let questions = questions_from_issues(&conflicts, &[urgent, minor]);
        assert_eq!(
            questions,
            vec![
                "\"Works offline\" and \"Live sync\" pull in different directions. Which should take priority?",
                "How should we approach Offline merge?",
            ]
        );
    }

    #[test]
    fn test_summary_none_when_nothing_to_report() {
        let evaluator = ConfidenceEvaluator::default();
        assert!(build_professional_summary(&evaluator, 90, &[], &[], &[]).is_none());
    }

    #[test]
    fn test_summary_orders_by_severity() {
        let evaluator = ConfidenceEvaluator::default();
        let mut low = ArchitecturalConflict::between("A fast app", "Heavy analytics");
        low.severity = Severity::Low;
        let mut high = ArchitecturalConflict::between("Works offline", "Live sync");
        high.severity = Severity::High;
        high.resolution.recommendation = "Queue edits".to_string();

        let summary = build_professional_summary(
            &evaluator,
            72,
            &[low, high],
            &[],
            &["No budget".to_string()],
        )
        .unwrap();

        assert!(summary.contains("**Overall confidence:** 72/100 (acceptable)"));
        let high_pos = summary.find("[HIGH]").unwrap();
        let low_pos = summary.find("[LOW]").unwrap();
        assert!(high_pos < low_pos);
        assert!(summary.contains("Recommendation: Queue edits"));
        assert!(summary.ends_with("- No budget"));
    }
}
