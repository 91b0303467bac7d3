//! Services
//!
//! Business logic behind the public API.

pub mod requirements;

pub use requirements::{
    ClarificationDeduplicator, ConfidenceEvaluator, ContextBudgeter, RelevanceValidator,
    RequirementsStateMachine,
};
