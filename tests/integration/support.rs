//! Routed completion-service stub shared by the integration tests.

use std::sync::Mutex;

use async_trait::async_trait;

use requirements_cascade_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
};

// ============================================================================
// Canned analysis payloads
// ============================================================================

pub fn analysis_json(confidence: u8, clarifications: &[&str], assumptions: &[&str]) -> String {
    format!(
        "Here is my assessment.\n```json\n{}\n```",
        serde_json::json!({
            "confidence": confidence,
            "clarifications_needed": clarifications,
            "assumptions": assumptions,
            "gaps": [],
        })
    )
}

// Distinct opening lines of each system prompt
pub const REQUIREMENTS_PROMPT: &str = "how complete a product request is";
pub const STACK_PROMPT: &str = "specifies its technical stack";
pub const REANALYSIS_PROMPT: &str = "re-assessing a product request";
pub const CONFLICT_PROMPT: &str = "statements for architectural conflicts";
pub const CHALLENGE_PROMPT: &str = "statements for technical challenges";
pub const STRICT_PROMPT: &str = "STRICT MODE";

// ============================================================================
// Provider stub
// ============================================================================

#[derive(Debug, Clone)]
pub struct Call {
    pub system: String,
    pub user: String,
    pub temperature: Option<f32>,
}

/// Answers by the first route whose needle appears in the system prompt.
/// Routes holding several responses hand them out in order and then repeat
/// the last one.
pub struct RoutedProvider {
    name: &'static str,
    context_window: u32,
    routes: Vec<(String, Mutex<Vec<String>>)>,
    failing: Vec<String>,
    calls: Mutex<Vec<Call>>,
    config: ProviderConfig,
}

impl RoutedProvider {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            context_window: 128_000,
            routes: Vec::new(),
            failing: Vec::new(),
            calls: Mutex::new(Vec::new()),
            config: ProviderConfig::default(),
        }
    }

    pub fn with_context_window(mut self, tokens: u32) -> Self {
        self.context_window = tokens;
        self
    }

    pub fn route<S: AsRef<str>>(mut self, needle: &str, responses: &[S]) -> Self {
        let responses = responses.iter().map(|r| r.as_ref().to_string()).collect();
        self.routes.push((needle.to_string(), Mutex::new(responses)));
        self
    }

    pub fn failing(mut self, needle: &str) -> Self {
        self.failing.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, needle: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.system.contains(needle))
            .collect()
    }
}

#[async_trait]
impl LlmProvider for RoutedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn model(&self) -> &str {
        "stub-model"
    }

    fn context_window(&self) -> u32 {
        self.context_window
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let system = messages.first().map(|m| m.content.clone()).unwrap_or_default();
        let user = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.calls.lock().unwrap().push(Call {
            system: system.clone(),
            user,
            temperature: request_options.temperature_override,
        });

        if self.failing.iter().any(|needle| system.contains(needle)) {
            return Err(LlmError::NetworkError {
                message: "connection refused".to_string(),
            });
        }

        let text = self
            .routes
            .iter()
            .find(|(needle, _)| system.contains(needle))
            .map(|(_, responses)| {
                let mut responses = responses.lock().unwrap();
                if responses.len() > 1 {
                    responses.remove(0)
                } else {
                    responses.first().cloned().unwrap_or_default()
                }
            })
            .unwrap_or_default();

        Ok(LlmResponse::text(text, "stub-model"))
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}
