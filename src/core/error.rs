// src/core/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Every way a scenario run can stop short of a successful report.
///
/// Variants are grouped the same way the harness reports them to the operator:
/// configuration errors (an unknown scenario), fixture and workspace I/O errors,
/// and tool execution errors. All of them map to exit status 1.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The requested scenario is not in the registry.
    #[error("Invalid test type '{name}'. Available types: {}", .available.join(", "))]
    UnknownScenario {
        name: String,
        available: Vec<&'static str>,
    },

    /// The scratch directory could not be created.
    #[error("failed to prepare workspace {}: {source}", .path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A fixture file could not be written.
    #[error("failed to write fixture {}: {source}", .path.display())]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A command step declared no program to run.
    #[error("command step is empty")]
    EmptyCommand,

    /// The external tool could not be started at all.
    #[error("failed to start `{program}`: {source}")]
    ToolSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool ran and reported failure through its exit status.
    #[error("Command failed: {command} ({})", describe_exit(.code))]
    ToolFailed { command: String, code: Option<i32> },

    /// `--expect-findings` was given but the scanner exited cleanly.
    #[error("Command succeeded but findings were expected: {command}")]
    NoFindings { command: String },

    /// The external tool did not finish within the configured limit.
    #[error("Command timed out after {secs}s: {command}")]
    ToolTimedOut { command: String, secs: u64 },

    /// Relaying or collecting the tool's output failed.
    #[error("failed to relay output of `{program}`: {source}")]
    ToolIo {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The report could not be persisted.
    #[error("failed to write report {}: {source}", .path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    ReportJson(#[from] serde_json::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}
