//! HTTP Client Factory
//!
//! Builds the reqwest client shared by the HTTP providers.

use std::time::Duration;

use super::types::{LlmError, LlmResult, ProviderConfig};

/// Build a `reqwest::Client` for the given provider configuration.
///
/// - `request_timeout_secs: Some(n)` -> every request is bounded to `n` seconds
/// - `None` -> no client-side timeout; callers layer their own if needed
pub fn build_http_client(config: &ProviderConfig) -> LlmResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(|e| LlmError::Other {
        message: format!("failed to build HTTP client: {}", e),
    })
}
