//! OpenAI-Compatible Provider
//!
//! Chat-completions client for OpenAI and for servers exposing the same
//! wire format (Ollama's `/v1/chat/completions`, vLLM, LM Studio).

use async_trait::async_trait;
use serde::Deserialize;

use super::http_client::build_http_client;
use super::provider::{missing_api_key_error, network_error, parse_http_error, LlmProvider};
use super::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig, ProviderType,
    StopReason, UsageStats,
};

/// Default OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default endpoint of a local Ollama server
const OLLAMA_API_URL: &str = "http://localhost:11434/v1/chat/completions";

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(&config)?;
        Ok(Self { config, client })
    }

    /// Get the API endpoint
    fn base_url(&self) -> &str {
        match (&self.config.base_url, self.config.provider) {
            (Some(url), _) => url.as_str(),
            (None, ProviderType::Ollama) => OLLAMA_API_URL,
            (None, _) => OPENAI_API_URL,
        }
    }

    /// Local servers accept requests without a key
    fn requires_api_key(&self) -> bool {
        self.config.provider != ProviderType::Ollama
    }

    /// Check if model is a reasoning model that rejects `temperature`
    fn model_is_reasoning(&self) -> bool {
        let model = self.config.model.to_lowercase();
        model.starts_with("o1") || model.starts_with("o3") || model.starts_with("o4")
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[Message],
        request_options: &LlmRequestOptions,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": request_options
                .max_tokens_override
                .unwrap_or(self.config.max_tokens),
            "stream": false,
        });

        if !self.model_is_reasoning() {
            body["temperature"] = serde_json::json!(request_options
                .temperature_override
                .unwrap_or(self.config.temperature));
        }

        let openai_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role.as_str(),
                    "content": msg.content,
                })
            })
            .collect();
        body["messages"] = serde_json::json!(openai_messages);

        body
    }

    /// Parse the API response into our format
    fn parse_response(&self, response: &OpenAIResponse) -> LlmResponse {
        let choice = response.choices.first();

        let content = choice
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone());

        let stop_reason = choice
            .and_then(|c| c.finish_reason.as_ref())
            .map(|r| StopReason::from(r.as_str()))
            .unwrap_or(StopReason::EndTurn);

        let usage = response
            .usage
            .as_ref()
            .map(|u| UsageStats {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        LlmResponse {
            content,
            stop_reason,
            usage,
            model: response.model.clone(),
        }
    }

    async fn post(&self, body: &serde_json::Value) -> LlmResult<String> {
        let mut request = self
            .client
            .post(self.base_url())
            .header("Content-Type", "application/json")
            .json(body);

        match self.config.api_key.as_ref() {
            Some(key) => request = request.header("Authorization", format!("Bearer {}", key)),
            None if self.requires_api_key() => return Err(missing_api_key_error(self.name())),
            None => {}
        }

        tracing::debug!(provider = self.name(), url = self.base_url(), "chat completion POST");
        let response = request.send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(network_error)?;

        if status != 200 {
            tracing::warn!(provider = self.name(), status, "chat completion request failed");
            return Err(parse_http_error(status, &body_text, self.name()));
        }
        Ok(body_text)
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        self.config.provider.as_str()
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn context_window(&self) -> u32 {
        if let Some(window) = self.config.context_window {
            return window;
        }
        match self.config.provider {
            // Ollama's default num_ctx
            ProviderType::Ollama => 8_192,
            _ => 128_000,
        }
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let body = self.build_request_body(&messages, &request_options);
        let body_text = self.post(&body).await?;

        let openai_response: OpenAIResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(self.parse_response(&openai_response))
    }

    async fn health_check(&self) -> LlmResult<()> {
        let options = LlmRequestOptions {
            max_tokens_override: Some(1),
            ..Default::default()
        };
        let body = self.build_request_body(&[Message::user("ping")], &options);
        self.post(&body).await.map(|_| ())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
