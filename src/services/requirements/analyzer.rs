//! Requirements Analyzer
//!
//! Issues the top-level analysis prompts: requirements completeness,
//! technical-stack completeness, and re-analysis of enriched input.
//!
//! Service failures propagate; format drift falls back to neutral defaults.

use std::sync::Arc;

use requirements_cascade_llm::{LlmProvider, LlmRequestOptions, Message};

use crate::models::RequirementsAnalysis;
use crate::utils::error::AppResult;

use super::prompts;
use super::structured::parse_analysis;

/// Sends the analysis prompts through one completion provider
#[derive(Clone)]
pub struct RequirementsAnalyzer {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl RequirementsAnalyzer {
    pub fn new(provider: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
        }
    }

    /// How complete is the product request as a whole
    pub async fn analyze_requirements(&self, text: &str) -> AppResult<RequirementsAnalysis> {
        self.run("requirements", prompts::requirements_analysis_prompt(), text)
            .await
    }

    /// How completely the request pins down its technical stack
    pub async fn analyze_technical_stack(&self, text: &str) -> AppResult<RequirementsAnalysis> {
        self.run("technical_stack", prompts::technical_stack_prompt(), text)
            .await
    }

    /// Re-assess input that has been enriched with clarification answers
    pub async fn reanalyze(&self, enriched_text: &str) -> AppResult<RequirementsAnalysis> {
        self.run("reanalysis", prompts::reanalysis_prompt(), enriched_text)
            .await
    }

    async fn run(
        &self,
        kind: &'static str,
        template: String,
        text: &str,
    ) -> AppResult<RequirementsAnalysis> {
        let messages = vec![Message::system(template), Message::user(text)];
        let response = self
            .provider
            .send_message(messages, LlmRequestOptions::with_temperature(self.temperature))
            .await?;

        let analysis = parse_analysis(response.text_or_empty());
        tracing::debug!(
            kind,
            confidence = analysis.confidence,
            clarifications = analysis.clarifications_needed.len(),
            gaps = analysis.gaps.len(),
            "analysis complete"
        );
        Ok(analysis)
    }
}
