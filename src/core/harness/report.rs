// src/core/harness/report.rs

use super::workspace::{FileSink, Workspace};
use crate::core::error::HarnessError;
use crate::core::models::Outcome;
use crate::core::registry::Scenario;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// File name of the Markdown report inside the workspace.
pub const REPORT_FILE: &str = "test-report.md";
/// File name of the optional JSON export.
pub const JSON_REPORT_FILE: &str = "test-report.json";

/// How many trailing lines of tool output are kept in the report.
pub const OUTPUT_EXCERPT_LINES: usize = 40;

const SUCCESS_FINDINGS: &[&str] = &[
    "Intentional vulnerabilities were detected as expected",
    "Security tools successfully identified the issues",
    "Notification systems were triggered",
];

/// The record of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Report {
    pub scenario: Scenario,
    pub timestamp: DateTime<Utc>,
    pub outcome: Outcome,
    pub command: String,
    /// Summary lines for a successful run.
    pub findings: Vec<String>,
    /// Error message for a failed run.
    pub error: Option<String>,
    pub remediation: Vec<String>,
    /// Tail of the captured tool output, when any was captured.
    pub output_excerpt: Option<String>,
}

impl Report {
    pub fn success(scenario: Scenario, timestamp: DateTime<Utc>) -> Self {
        Self {
            scenario,
            timestamp,
            outcome: Outcome::Success,
            command: scenario.detail().command.to_string(),
            findings: SUCCESS_FINDINGS.iter().map(|s| s.to_string()).collect(),
            error: None,
            remediation: Vec::new(),
            output_excerpt: None,
        }
    }

    pub fn failure(scenario: Scenario, timestamp: DateTime<Utc>, error: &HarnessError) -> Self {
        let detail = scenario.detail();
        let mut remediation: Vec<String> =
            detail.remediation.iter().map(|s| s.to_string()).collect();
        remediation.push(format!("Re-run `vanguard-sectest {scenario}` after fixing the issue"));
        Self {
            scenario,
            timestamp,
            outcome: Outcome::Failed,
            command: detail.command.to_string(),
            findings: Vec::new(),
            error: Some(error.to_string()),
            remediation,
            output_excerpt: None,
        }
    }

    /// Attaches the last `OUTPUT_EXCERPT_LINES` lines of `output`. Blank
    /// output leaves the report unchanged.
    pub fn with_output(mut self, output: &str) -> Self {
        if output.trim().is_empty() {
            return self;
        }
        let lines: Vec<&str> = output.lines().collect();
        let start = lines.len().saturating_sub(OUTPUT_EXCERPT_LINES);
        self.output_excerpt = Some(lines[start..].join("\n"));
        self
    }

    /// Renders the fixed-format Markdown document.
    pub fn render_markdown(&self) -> String {
        let date = self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut lines = vec![
            "# Security Test Report".to_string(),
            format!("## Test Type: {}", self.scenario),
            format!("## Date: {date}"),
            format!("## Status: {}", self.outcome),
            format!("## Command: `{}`", self.command),
        ];
        match self.outcome {
            Outcome::Success => {
                lines.push("## Findings:".to_string());
                lines.extend(self.findings.iter().map(|finding| format!("- {finding}")));
            }
            Outcome::Failed => {
                lines.push("## Error Details:".to_string());
                lines.push(self.error.clone().unwrap_or_else(|| "unknown error".to_string()));
                lines.push(String::new());
                lines.push("## Remediation:".to_string());
                lines.extend(
                    self.remediation
                        .iter()
                        .enumerate()
                        .map(|(i, hint)| format!("{}. {hint}", i + 1)),
                );
            }
        }
        if let Some(excerpt) = &self.output_excerpt {
            lines.push(String::new());
            lines.push(format!("## Tool Output (last {OUTPUT_EXCERPT_LINES} lines):"));
            lines.push("```".to_string());
            lines.push(excerpt.clone());
            lines.push("```".to_string());
        }

        let mut md = lines.join("\n");
        md.push('\n');
        md
    }
}

/// Persists the report into the workspace, replacing any previous one.
///
/// Returns the path of the Markdown report. With `json` set, the JSON export
/// is written first; if it cannot be written, the Markdown report records
/// that failure instead of a success, so it never disagrees with the exit
/// status.
pub fn write_report(
    report: &Report,
    workspace: &Workspace,
    sink: &impl FileSink,
    json: bool,
) -> Result<PathBuf, HarnessError> {
    let exported = if json {
        write_json(report, workspace, sink)
    } else {
        Ok(())
    };

    let markdown = match &exported {
        Err(e) if report.outcome == Outcome::Success => {
            warn!(error = %e, "JSON export failed, recording the run as failed.");
            Report {
                output_excerpt: report.output_excerpt.clone(),
                ..Report::failure(report.scenario, report.timestamp, e)
            }
            .render_markdown()
        }
        _ => report.render_markdown(),
    };

    let path = workspace.join(REPORT_FILE);
    sink.write(&path, markdown.as_bytes())
        .map_err(|source| HarnessError::Report {
            path: path.clone(),
            source,
        })?;
    info!(path = %path.display(), outcome = %report.outcome, "Report written.");

    exported.map(|()| path)
}

fn write_json(
    report: &Report,
    workspace: &Workspace,
    sink: &impl FileSink,
) -> Result<(), HarnessError> {
    let path = workspace.join(JSON_REPORT_FILE);
    let body = serde_json::to_vec_pretty(report)?;
    sink.write(&path, &body)
        .map_err(|source| HarnessError::Report {
            path: path.clone(),
            source,
        })?;
    info!(path = %path.display(), "JSON report written.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::harness::workspace::memory::MemorySink;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap()
    }

    #[test]
    fn success_report_has_the_fixed_layout() {
        let md = Report::success(Scenario::Dependencies, fixed_time()).render_markdown();
        assert_eq!(
            md,
            "# Security Test Report\n\
             ## Test Type: dependencies\n\
             ## Date: 2026-10-19T08:30:00.000Z\n\
             ## Status: Success\n\
             ## Command: `npm audit`\n\
             ## Findings:\n\
             - Intentional vulnerabilities were detected as expected\n\
             - Security tools successfully identified the issues\n\
             - Notification systems were triggered\n"
        );
    }

    #[test]
    fn failure_report_carries_error_and_hints() {
        let err = HarnessError::ToolFailed {
            command: "npm audit".to_string(),
            code: Some(1),
        };
        let md = Report::failure(Scenario::Dependencies, fixed_time(), &err).render_markdown();
        assert!(md.contains("## Status: Failed\n"));
        assert!(md.contains("## Error Details:\nCommand failed: npm audit (exit status 1)\n"));
        assert!(md.contains("1. Verify `npm` is installed"));
        assert!(md.contains("4. Re-run `vanguard-sectest dependencies`"));
        assert!(!md.contains("## Findings:"));
    }

    #[test]
    fn output_excerpt_keeps_only_the_tail() {
        let output: String = (1..=50).map(|i| format!("line {i}\n")).collect();
        let report = Report::success(Scenario::Code, fixed_time()).with_output(&output);
        let excerpt = report.output_excerpt.unwrap();
        assert_eq!(excerpt.lines().count(), OUTPUT_EXCERPT_LINES);
        assert!(excerpt.starts_with("line 11"));
        assert!(excerpt.ends_with("line 50"));
    }

    #[test]
    fn blank_output_is_not_attached() {
        let report = Report::success(Scenario::Code, fixed_time()).with_output("  \n");
        assert!(report.output_excerpt.is_none());
        assert!(!report.render_markdown().contains("Tool Output"));
    }

    #[test]
    fn writing_twice_replaces_the_report() {
        let sink = MemorySink::default();
        let workspace = Workspace::prepare(&sink, "scratch").unwrap();
        let first = Report::success(Scenario::Docker, fixed_time());
        let err = HarnessError::ToolFailed {
            command: "trivy".to_string(),
            code: Some(2),
        };
        let second = Report::failure(Scenario::Docker, fixed_time(), &err);

        write_report(&first, &workspace, &sink, false).unwrap();
        let path = write_report(&second, &workspace, &sink, false).unwrap();

        assert_eq!(path, PathBuf::from("scratch/test-report.md"));
        assert_eq!(sink.files.borrow().len(), 1);
        assert!(sink.file(&path).unwrap().contains("## Status: Failed"));
    }

    #[test]
    fn json_export_is_opt_in() {
        let sink = MemorySink::default();
        let workspace = Workspace::prepare(&sink, "scratch").unwrap();
        let report = Report::success(Scenario::Docker, fixed_time());
        write_report(&report, &workspace, &sink, true).unwrap();

        let json = sink.file("scratch/test-report.json").unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
        assert!(json.contains("\"outcome\": \"success\""));
    }

    #[test]
    fn unwritable_json_turns_the_markdown_into_a_failure() {
        let sink = MemorySink::rejecting("scratch/test-report.json");
        let workspace = Workspace::prepare(&sink, "scratch").unwrap();
        let report = Report::success(Scenario::Code, fixed_time()).with_output("no problems\n");

        let err = write_report(&report, &workspace, &sink, true).unwrap_err();
        assert!(matches!(err, HarnessError::Report { .. }));

        let md = sink.file("scratch/test-report.md").unwrap();
        assert!(md.contains("## Status: Failed\n"));
        assert!(md.contains("scratch/test-report.json"));
        assert!(md.contains("no problems"));
        assert!(!md.contains("## Findings:"));
    }
}
