//! User Interaction Surface
//!
//! The human-in-the-loop capability consumed by the analysis pipeline.
//! Console and networked front-ends implement [`UserInteraction`]; the
//! pipeline only ever sees the trait object chosen at construction.
//!
//! [`ScriptedInteraction`] replays pre-recorded answers. It backs headless
//! runs (batch analysis with answers supplied up front) and the test suites.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Optional behaviours an interaction surface opts into at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionCapabilities {
    /// Emit detailed per-pass progress (batch counts, relevance scores)
    /// instead of only phase headlines.
    #[serde(default)]
    pub rich_progress: bool,
}

impl InteractionCapabilities {
    /// Capabilities with rich progress reporting enabled
    pub fn rich() -> Self {
        Self {
            rich_progress: true,
        }
    }
}

/// Capability interface for talking to the person who submitted the request.
///
/// Every method may suspend (a human is answering). No timeout is enforced
/// here; wrap the implementation if one is needed.
#[async_trait]
pub trait UserInteraction: Send + Sync {
    /// Ask a free-text question and return the raw answer.
    async fn ask_question(&self, question: &str) -> CoreResult<String>;

    /// Ask a yes/no question.
    async fn ask_yes_no(&self, question: &str) -> CoreResult<bool>;

    /// Show an informational message.
    async fn show_info(&self, message: &str) -> CoreResult<()>;

    /// Show a warning message.
    async fn show_warning(&self, message: &str) -> CoreResult<()>;

    /// Show a progress update.
    async fn show_progress(&self, message: &str) -> CoreResult<()>;
}

/// One recorded exchange with a [`ScriptedInteraction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum InteractionEvent {
    Question(String),
    YesNo(String),
    Info(String),
    Warning(String),
    Progress(String),
}

/// Interaction surface that replays queued answers.
///
/// Once the answer queue is drained every question receives an empty
/// answer; once the confirmation queue is drained every yes/no question
/// receives `default_confirmation`.
#[derive(Debug, Default)]
pub struct ScriptedInteraction {
    answers: Mutex<VecDeque<String>>,
    confirmations: Mutex<VecDeque<bool>>,
    default_confirmation: bool,
    transcript: Mutex<Vec<InteractionEvent>>,
}

impl ScriptedInteraction {
    /// Create a scripted surface with queued answers and confirmations.
    pub fn new<A, S>(answers: A, confirmations: Vec<bool>) -> Self
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            confirmations: Mutex::new(confirmations.into_iter().collect()),
            default_confirmation: false,
            transcript: Mutex::new(Vec::new()),
        }
    }

    /// Answer every unscripted yes/no question with `value`.
    pub fn with_default_confirmation(mut self, value: bool) -> Self {
        self.default_confirmation = value;
        self
    }

    /// Everything asked or shown so far, in order.
    pub fn transcript(&self) -> Vec<InteractionEvent> {
        self.transcript
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Questions asked so far (free-text only).
    pub fn questions_asked(&self) -> Vec<String> {
        self.transcript()
            .into_iter()
            .filter_map(|event| match event {
                InteractionEvent::Question(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: InteractionEvent) -> CoreResult<()> {
        self.transcript
            .lock()
            .map_err(|_| CoreError::internal("interaction transcript lock poisoned"))?
            .push(event);
        Ok(())
    }
}

#[async_trait]
impl UserInteraction for ScriptedInteraction {
    async fn ask_question(&self, question: &str) -> CoreResult<String> {
        self.record(InteractionEvent::Question(question.to_string()))?;
        let answer = self
            .answers
            .lock()
            .map_err(|_| CoreError::internal("answer queue lock poisoned"))?
            .pop_front()
            .unwrap_or_default();
        Ok(answer)
    }

    async fn ask_yes_no(&self, question: &str) -> CoreResult<bool> {
        self.record(InteractionEvent::YesNo(question.to_string()))?;
        let answer = self
            .confirmations
            .lock()
            .map_err(|_| CoreError::internal("confirmation queue lock poisoned"))?
            .pop_front()
            .unwrap_or(self.default_confirmation);
        Ok(answer)
    }

    async fn show_info(&self, message: &str) -> CoreResult<()> {
        self.record(InteractionEvent::Info(message.to_string()))
    }

    async fn show_warning(&self, message: &str) -> CoreResult<()> {
        self.record(InteractionEvent::Warning(message.to_string()))
    }

    async fn show_progress(&self, message: &str) -> CoreResult<()> {
        self.record(InteractionEvent::Progress(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_answers_in_order() {
        let ui = ScriptedInteraction::new(["first", "second"], vec![]);
        assert_eq!(ui.ask_question("Q1?").await.unwrap(), "first");
        assert_eq!(ui.ask_question("Q2?").await.unwrap(), "second");
        // Drained queue yields empty answers
        assert_eq!(ui.ask_question("Q3?").await.unwrap(), "");
        assert_eq!(ui.questions_asked(), vec!["Q1?", "Q2?", "Q3?"]);
    }

    #[tokio::test]
    async fn test_scripted_confirmations_fall_back_to_default() {
        let ui = ScriptedInteraction::new(Vec::<String>::new(), vec![false])
            .with_default_confirmation(true);
        assert!(!ui.ask_yes_no("Proceed?").await.unwrap());
        assert!(ui.ask_yes_no("Proceed again?").await.unwrap());
    }

    #[tokio::test]
    async fn test_transcript_records_messages() {
        let ui = ScriptedInteraction::default();
        ui.show_info("hello").await.unwrap();
        ui.show_warning("careful").await.unwrap();
        ui.show_progress("50%").await.unwrap();

        assert_eq!(
            ui.transcript(),
            vec![
                InteractionEvent::Info("hello".to_string()),
                InteractionEvent::Warning("careful".to_string()),
                InteractionEvent::Progress("50%".to_string()),
            ]
        );
    }

    #[test]
    fn test_capabilities_default_is_plain() {
        assert!(!InteractionCapabilities::default().rich_progress);
        assert!(InteractionCapabilities::rich().rich_progress);
    }
}
