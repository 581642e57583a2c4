// src/app.rs

use crate::core::error::HarnessError;
use crate::core::harness::{
    FileSink, Report, ToolRunner, Workspace, invoke, materialize, write_report,
};
use crate::core::models::{ExecutionResult, Outcome};
use crate::core::registry::{self, Scenario};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Where the orchestrator is in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Idle,
    Validating,
    SettingUp,
    Executing,
    Reporting,
    Succeeded,
    Failed,
}

/// Run configuration coming from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Scratch directory the fixture and report are written to.
    pub workdir: PathBuf,
    /// Treat a non-zero exit of the final scanner step as the expected result.
    pub expect_findings: bool,
    /// Also write `test-report.json`.
    pub json_report: bool,
}

/// What a run that reached the reporting stage produced.
#[derive(Debug)]
pub struct RunSummary {
    pub scenario: Scenario,
    pub outcome: Outcome,
    pub report_path: PathBuf,
    pub error: Option<HarnessError>,
}

/// Drives one scenario through validation, setup, execution and reporting.
pub struct App<S, R> {
    pub state: AppState,
    sink: S,
    runner: R,
    options: RunOptions,
}

impl<S: FileSink, R: ToolRunner> App<S, R> {
    pub fn new(sink: S, runner: R, options: RunOptions) -> Self {
        Self {
            state: AppState::Idle,
            sink,
            runner,
            options,
        }
    }

    fn transition(&mut self, next: AppState) {
        debug!(from = ?self.state, to = ?next, "State transition.");
        self.state = next;
    }

    /// Runs the named scenario to completion.
    ///
    /// `Err` means the run stopped before a report could be written: an
    /// unknown name, a workspace or fixture error, or a report that could not
    /// be persisted. Every run that reaches execution returns a summary, and
    /// its outcome decides the exit status.
    pub async fn run(&mut self, name: &str) -> Result<RunSummary, HarnessError> {
        self.transition(AppState::Validating);
        let scenario = match registry::lookup(name) {
            Ok(scenario) => scenario,
            Err(e) => {
                error!(name, "Unknown scenario requested.");
                self.transition(AppState::Failed);
                return Err(e);
            }
        };
        let detail = scenario.detail();
        println!("Running {}...", detail.description);

        self.transition(AppState::SettingUp);
        let workspace = match Workspace::prepare(&self.sink, &self.options.workdir)
            .and_then(|ws| materialize(detail, &ws, &self.sink).map(|_| ws))
        {
            Ok(ws) => ws,
            Err(e) => {
                error!(error = %e, "Fixture setup failed.");
                self.transition(AppState::Failed);
                return Err(e);
            }
        };

        self.transition(AppState::Executing);
        println!("Executing test command...");
        let (verdict, output) = match invoke(&self.runner, &detail.command, &workspace).await {
            Ok(result) => (self.judge(&result), Some(result.combined_output())),
            Err(e) => (Err(e), None),
        };

        self.transition(AppState::Reporting);
        let now = Utc::now();
        let report = match &verdict {
            Ok(()) => Report::success(scenario, now),
            Err(e) => Report::failure(scenario, now, e),
        };
        let report = match output {
            Some(output) => report.with_output(&output),
            None => report,
        };
        let written = write_report(&report, &workspace, &self.sink, self.options.json_report);
        let report_path = match written {
            Ok(path) => path,
            Err(e) => {
                self.transition(AppState::Failed);
                return Err(e);
            }
        };

        let outcome = report.outcome;
        match outcome {
            Outcome::Success => self.transition(AppState::Succeeded),
            Outcome::Failed => self.transition(AppState::Failed),
        }
        info!(scenario = %scenario, outcome = %outcome, "Scenario finished.");
        Ok(RunSummary {
            scenario,
            outcome,
            report_path,
            error: verdict.err(),
        })
    }

    /// Maps the tool's exit statuses to a verdict.
    ///
    /// By default every step must exit 0. With `expect_findings`, the final
    /// scanner step is instead required to exit with a non-zero code; earlier
    /// steps must still succeed and a scanner killed by a signal is a failure.
    fn judge(&self, result: &ExecutionResult) -> Result<(), HarnessError> {
        if self.options.expect_findings {
            if result.failed_in_final_step() {
                return Ok(());
            }
            if result.success() {
                let command = result.steps.last().map(|s| s.command.clone()).unwrap_or_default();
                return Err(HarnessError::NoFindings { command });
            }
        } else if result.success() {
            return Ok(());
        }
        let (command, code) = match result.failed_step() {
            Some(step) => (step.command.clone(), step.code),
            None => (String::new(), None),
        };
        Err(HarnessError::ToolFailed { command, code })
    }
}
