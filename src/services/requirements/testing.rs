//! Test doubles for the completion service.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use requirements_cascade_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
};

/// One recorded `send_message` call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
}

struct Route {
    needle: String,
    /// Popped in order; the last response repeats
    responses: Mutex<VecDeque<String>>,
}

/// Routes canned responses by message content.
///
/// Concurrent detection calls arrive in no particular order, so responses
/// are keyed by a substring of the prompt rather than by call sequence.
pub struct MockProvider {
    routes: Vec<Route>,
    failures: Vec<String>,
    fallback: String,
    calls: Mutex<Vec<RecordedCall>>,
    config: ProviderConfig,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            failures: Vec::new(),
            fallback: String::new(),
            calls: Mutex::new(Vec::new()),
            config: ProviderConfig::default(),
        }
    }

    /// Answer prompts containing `needle`. Repeated needles queue responses.
    pub fn route(mut self, needle: &str, response: &str) -> Self {
        if let Some(route) = self.routes.iter().find(|r| r.needle == needle) {
            route.responses.lock().unwrap().push_back(response.to_string());
        } else {
            self.routes.push(Route {
                needle: needle.to_string(),
                responses: Mutex::new(VecDeque::from([response.to_string()])),
            });
        }
        self
    }

    /// Fail prompts containing `needle` with a network error
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.failures.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_containing(&self, needle: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.messages.iter().any(|m| m.content.contains(needle)))
            .count()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let prompt: String = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.calls.lock().unwrap().push(RecordedCall {
            messages,
            temperature: request_options.temperature_override,
        });

        if self.failures.iter().any(|needle| prompt.contains(needle)) {
            return Err(LlmError::NetworkError {
                message: "mock network failure".to_string(),
            });
        }

        let text = self
            .routes
            .iter()
            .find(|route| prompt.contains(&route.needle))
            .map(|route| {
                let mut queue = route.responses.lock().unwrap();
                if queue.len() > 1 {
                    queue.pop_front().unwrap_or_default()
                } else {
                    queue.front().cloned().unwrap_or_default()
                }
            })
            .unwrap_or_else(|| self.fallback.clone());

        Ok(LlmResponse::text(text, "mock-model"))
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}
