// src/core/mod.rs

/// Error types shared by the harness modules.
pub mod error;

/// Plain data used across the harness: fixture files, tool commands, step
/// results and the run outcome.
pub mod models;

/// The static table of scenarios the harness can run.
pub mod registry;

/// Workspace, fixture writing, tool invocation and report writing.
pub mod harness;

/// Read-only assertions over the checked-in CI configuration.
pub mod checks;
