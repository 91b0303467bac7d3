//! Requirements Cascade LLM
//!
//! Unified interface to the text-completion services the analysis pipeline
//! queries:
//! - Anthropic Claude (Messages API)
//! - OpenAI and OpenAI-compatible servers (Chat Completions API)
//! - Ollama via its OpenAI-compatible endpoint

pub mod anthropic;
pub mod http_client;
pub mod openai;
pub mod provider;
pub mod types;

use std::sync::Arc;

// Re-export main types
pub use anthropic::AnthropicProvider;
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;

/// Build the provider selected by `config.provider`.
pub fn create_provider(config: ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderType::Anthropic => Arc::new(AnthropicProvider::new(config)?),
        ProviderType::OpenAI | ProviderType::Ollama => Arc::new(OpenAIProvider::new(config)?),
    };
    Ok(provider)
}
