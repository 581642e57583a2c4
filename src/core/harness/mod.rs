// src/core/harness/mod.rs

// The collaborators the orchestrator sequences for a single scenario run:
// workspace preparation, fixture writing, tool invocation and reporting.
pub mod fixtures;
pub mod invoker;
pub mod report;
pub mod workspace;

pub use self::fixtures::materialize;
pub use self::invoker::{ProcessRunner, ToolRunner, invoke};
pub use self::report::{Report, write_report};
pub use self::workspace::{DEFAULT_WORKDIR, DiskSink, FileSink, Workspace};
