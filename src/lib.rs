//! Requirements Cascade - Rust Backend Library
//!
//! Analyzes free-text product requests before any design document is
//! written. It includes:
//! - Confidence scoring of the request and of its technical stack
//! - Architectural conflict detection and technical challenge prediction
//! - Interactive clarification driven by a state machine
//! - Data models, settings and error types

pub mod models;
pub mod services;
pub mod utils;

// Re-export the pipeline entry points
pub use models::requirements::{AnalysisState, EnrichedRequirements};
pub use models::settings::AnalysisSettings;
pub use services::requirements::{ContextBudgeter, ContextEnrichment, RequirementsStateMachine};
pub use utils::error::{AppError, AppResult};

// Collaborator crates
pub use requirements_cascade_core::{
    InteractionCapabilities, ScriptedInteraction, UserInteraction,
};
pub use requirements_cascade_llm::{create_provider, LlmProvider, ProviderConfig, ProviderType};
