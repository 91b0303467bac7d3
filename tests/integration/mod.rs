//! Integration Tests Module
//!
//! End-to-end tests for the requirements analysis pipeline. No network
//! calls are made; completion services are replaced by a routed stub.

// Shared provider stub
mod support;

// State machine runs: critically-low, clarification and strict-retry paths
mod pipeline_test;

// Section context sizing against provider ceilings
mod context_budget_test;

// Settings files driving the pipeline
mod settings_test;
