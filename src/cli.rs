//! Command-line surface.
//!
//! - `vanguard-sectest <SCENARIO>` runs one security-test scenario
//! - `vanguard-sectest list` prints the registered scenarios
//! - `vanguard-sectest check` validates the CI workflow configuration
//!
//! Command handlers return an `ExitCode`; only `main` turns it into the
//! process status.

use crate::app::{App, RunOptions};
use crate::core::checks::{default_checks, run_checks};
use crate::core::harness::{DEFAULT_WORKDIR, DiskSink, ProcessRunner};
use crate::core::registry;
use crate::ui;
use clap::{Args, Parser, Subcommand};
use crossterm::style::Stylize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

/// Security-test harness for the scanning pipeline
#[derive(Parser, Debug)]
#[command(name = "vanguard-sectest", version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Scenario to run (see `list`)
    #[arg(value_name = "SCENARIO")]
    pub scenario: Option<String>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scratch directory for the fixture and the report
    #[arg(long, value_name = "DIR", default_value = DEFAULT_WORKDIR)]
    pub workdir: PathBuf,

    /// Count a non-zero exit of the scanner as the expected result
    #[arg(long)]
    pub expect_findings: bool,

    /// Kill the tool if a single step runs longer than this
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Also write test-report.json
    #[arg(long)]
    pub json_report: bool,
}

impl RunArgs {
    fn options(&self) -> RunOptions {
        RunOptions {
            workdir: self.workdir.clone(),
            expect_findings: self.expect_findings,
            json_report: self.json_report,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the registered scenarios
    List,

    /// Validate the CI workflow files and ZAP rules
    Check {
        /// Repository root the workflow paths are relative to
        #[arg(long, value_name = "DIR", default_value = ".")]
        root: PathBuf,

        /// Print the outcomes as JSON instead of a checklist
        #[arg(long)]
        json: bool,
    },
}

/// Dispatches the parsed command line.
pub async fn execute(cli: Cli) -> ExitCode {
    match cli.command {
        Some(Command::List) => {
            print!("{}", ui::render_scenarios(registry::all()));
            ExitCode::SUCCESS
        }
        Some(Command::Check { root, json }) => check(root, json),
        None => match cli.scenario {
            Some(name) => run_scenario(&name, &cli.run).await,
            None => {
                eprintln!(
                    "{} no test type given. Available types: {}",
                    "error:".red(),
                    registry::available_names().join(", ")
                );
                ExitCode::FAILURE
            }
        },
    }
}

async fn run_scenario(name: &str, args: &RunArgs) -> ExitCode {
    info!(scenario = name, workdir = %args.workdir.display(), "Starting scenario run.");
    let runner = ProcessRunner::new(args.timeout.map(Duration::from_secs));
    let mut app = App::new(DiskSink, runner, args.options());
    match app.run(name).await {
        Ok(summary) => {
            info!(
                scenario = %summary.scenario,
                outcome = %summary.outcome,
                "Scenario run complete."
            );
            print!("{}", ui::render_summary(&summary));
            if summary.error.is_none() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            warn!(error = %e, "Scenario aborted before reporting.");
            eprintln!("{} {e}", "error:".red());
            ExitCode::FAILURE
        }
    }
}

fn check(root: PathBuf, json: bool) -> ExitCode {
    let outcomes = run_checks(&root, &default_checks());
    if json {
        match serde_json::to_string_pretty(&outcomes) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("{} {e}", "error:".red());
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", ui::render_checks(&outcomes));
    }
    if outcomes.iter().all(|o| o.passed) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_argument_selects_the_scenario() {
        let cli = Cli::try_parse_from(["vanguard-sectest", "docker"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.scenario.as_deref(), Some("docker"));
        assert_eq!(cli.run.workdir, PathBuf::from("test-env"));
        assert!(!cli.run.expect_findings);
    }

    #[test]
    fn run_flags_are_parsed() {
        let cli = Cli::try_parse_from([
            "vanguard-sectest",
            "code",
            "--workdir",
            "/tmp/scratch",
            "--expect-findings",
            "--timeout",
            "90",
            "--json-report",
        ])
        .unwrap();
        let options = cli.run.options();
        assert_eq!(options.workdir, PathBuf::from("/tmp/scratch"));
        assert!(options.expect_findings);
        assert!(options.json_report);
        assert_eq!(cli.run.timeout, Some(90));
    }

    #[test]
    fn subcommands_take_precedence_over_the_positional() {
        let cli = Cli::try_parse_from(["vanguard-sectest", "list"]).unwrap();
        assert!(matches!(cli.command, Some(Command::List)));

        let cli =
            Cli::try_parse_from(["vanguard-sectest", "check", "--root", "repo"]).unwrap();
        match cli.command {
            Some(Command::Check { root, json }) => {
                assert_eq!(root, PathBuf::from("repo"));
                assert!(!json);
            }
            other => panic!("expected Check, got {other:?}"),
        }
    }

    #[test]
    fn unknown_names_are_left_to_the_registry() {
        let cli = Cli::try_parse_from(["vanguard-sectest", "bogus"]).unwrap();
        assert_eq!(cli.scenario.as_deref(), Some("bogus"));
    }

    #[tokio::test]
    async fn missing_scenario_fails() {
        let cli = Cli::try_parse_from(["vanguard-sectest"]).unwrap();
        assert_eq!(execute(cli).await, ExitCode::FAILURE);
    }
}
