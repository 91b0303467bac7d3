//! Requirements Cascade Core
//!
//! Foundational types for the Requirements Cascade workspace. This crate has
//! no dependency on LLM providers or on the analysis pipeline itself.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `interaction` - The user-interaction capability (`UserInteraction`) and
//!   its scripted implementation

pub mod error;
pub mod interaction;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Interaction Surface ────────────────────────────────────────────────
pub use interaction::{
    InteractionCapabilities, InteractionEvent, ScriptedInteraction, UserInteraction,
};
