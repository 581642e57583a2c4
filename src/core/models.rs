// src/core/models.rs

use serde::{Deserialize, Serialize};
use std::fmt;

// --- Scenario Building Blocks ---

/// A single file of a scenario fixture: a path relative to the workspace and
/// its literal contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureFile {
    pub path: &'static str,
    pub contents: &'static str,
}

/// The external command attached to a scenario.
///
/// Each step is a program followed by its arguments. Steps run in order and the
/// first failing step stops the sequence, the way `a && b` does in a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolCommand {
    pub steps: &'static [&'static [&'static str]],
}

impl ToolCommand {
    /// Renders one step the way it would be typed in a shell.
    pub fn render_step(step: &[&str]) -> String {
        step.iter()
            .map(|arg| {
                if arg.is_empty() || arg.contains(char::is_whitespace) {
                    format!("\"{arg}\"")
                } else {
                    (*arg).to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.steps.iter().map(|s| Self::render_step(s)).collect();
        write!(f, "{}", rendered.join(" && "))
    }
}

// --- Execution ---

/// How a single step of a tool command finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub command: String,
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl StepResult {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// The outcome of invoking a scenario's command: one entry per step that ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub steps: Vec<StepResult>,
    /// Number of steps the command declares, including any that never ran.
    pub declared_steps: usize,
}

impl ExecutionResult {
    /// True when every declared step ran and exited with status 0.
    pub fn success(&self) -> bool {
        self.steps.len() == self.declared_steps && self.steps.iter().all(StepResult::success)
    }

    /// The first step that exited non-zero, if any.
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.steps.iter().find(|s| !s.success())
    }

    /// True when the only failing step is the last one, i.e. the scanner
    /// itself rather than a preparation step such as an image build, and it
    /// exited with a status code. A step terminated by a signal crashed; it
    /// did not report findings.
    pub fn failed_in_final_step(&self) -> bool {
        match self.failed_step() {
            Some(step) => {
                step.code.is_some()
                    && self.steps.len() == self.declared_steps
                    && self.steps.last() == Some(step)
            }
            None => false,
        }
    }

    /// Captured stdout and stderr of every step, in order.
    pub fn combined_output(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            out.push_str(&step.stdout);
            if !step.stdout.is_empty() && !step.stdout.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&step.stderr);
            if !step.stderr.is_empty() && !step.stderr.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}

// --- Reporting ---

/// Final verdict of a scenario run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "Success"),
            Outcome::Failed => write!(f, "Failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(command: &str, code: Option<i32>) -> StepResult {
        StepResult {
            command: command.to_string(),
            code,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    #[test]
    fn command_renders_like_a_shell_chain() {
        let command = ToolCommand {
            steps: &[
                &["docker", "build", "-t", "test-image", "."],
                &["eslint", "--rule", "no-eval: error", "app.js"],
            ],
        };
        assert_eq!(
            command.to_string(),
            "docker build -t test-image . && eslint --rule \"no-eval: error\" app.js"
        );
    }

    #[test]
    fn short_circuited_run_is_not_a_success() {
        let result = ExecutionResult {
            steps: vec![step("docker build", Some(0))],
            declared_steps: 2,
        };
        assert!(!result.success());
        assert!(result.failed_step().is_none());
    }

    #[test]
    fn preparation_failure_is_not_a_final_step_failure() {
        let result = ExecutionResult {
            steps: vec![step("docker build", Some(1))],
            declared_steps: 2,
        };
        assert!(!result.failed_in_final_step());

        let result = ExecutionResult {
            steps: vec![step("docker build", Some(0)), step("trivy image", Some(1))],
            declared_steps: 2,
        };
        assert!(result.failed_in_final_step());
    }

    #[test]
    fn signal_in_final_step_is_a_crash() {
        let result = ExecutionResult {
            steps: vec![step("docker build", Some(0)), step("trivy image", None)],
            declared_steps: 2,
        };
        assert!(!result.failed_in_final_step());
        assert_eq!(result.failed_step().and_then(|s| s.code), None);
    }

    #[test]
    fn combined_output_terminates_each_stream() {
        let result = ExecutionResult {
            steps: vec![StepResult {
                command: "npm audit".to_string(),
                code: Some(0),
                stdout: "found 0 vulnerabilities".to_string(),
                stderr: "warn".to_string(),
            }],
            declared_steps: 1,
        };
        assert_eq!(result.combined_output(), "found 0 vulnerabilities\nwarn\n");
    }
}
