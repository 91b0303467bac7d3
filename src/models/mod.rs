//! Data Models
//!
//! Contains all data structures used throughout the pipeline.

pub mod requirements;
pub mod settings;

pub use requirements::*;
pub use settings::*;
