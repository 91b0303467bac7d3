//! Bounded Fan-out
//!
//! Runs one task per work item under a concurrency cap. A failing or
//! panicking task contributes `T::default()` and never cancels its siblings.
//! Results come back in submission order.

use std::future::Future;
use std::sync::Arc;

use requirements_cascade_llm::{LlmProvider, LlmRequestOptions, Message};
use tokio::sync::Semaphore;
use tracing::warn;

use crate::utils::error::{AppError, AppResult};

pub async fn fan_out<I, T, F, Fut>(
    label: &'static str,
    items: Vec<I>,
    max_concurrent: usize,
    task: F,
) -> Vec<T>
where
    I: Send + 'static,
    T: Default + Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = AppResult<T>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut handles = Vec::with_capacity(items.len());

    for item in items {
        let sem = semaphore.clone();
        let work = task(item);
        handles.push(tokio::spawn(async move {
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|e| AppError::internal(format!("fan-out semaphore closed: {}", e)))?;
            work.await
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        let result = match handle.await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                warn!(label, index, error = %e, "fan-out task failed; contributing empty result");
                T::default()
            }
            Err(e) => {
                warn!(label, index, error = %e, "fan-out task aborted; contributing empty result");
                T::default()
            }
        };
        results.push(result);
    }
    results
}

/// Send one detection prompt per user message and flatten the parsed
/// findings in submission order.
pub async fn dispatch_prompts<T>(
    label: &'static str,
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
    user_messages: Vec<String>,
    temperature: f32,
    max_concurrent: usize,
    parse: fn(&str) -> Vec<T>,
) -> Vec<T>
where
    T: Send + 'static,
{
    let system_prompt = Arc::new(system_prompt);
    let per_request = fan_out(label, user_messages, max_concurrent, |user_message| {
        let provider = provider.clone();
        let system_prompt = system_prompt.clone();
        async move {
            let messages = vec![
                Message::system(system_prompt.as_str()),
                Message::user(user_message),
            ];
            let response = provider
                .send_message(messages, LlmRequestOptions::with_temperature(temperature))
                .await?;
            Ok::<_, AppError>(parse(response.text_or_empty()))
        }
    })
    .await;

    per_request.into_iter().flatten().collect()
}
