//! Static assertions over the checked-in CI configuration.
//!
//! Each check names one file (relative to the repository root) and one
//! predicate. Checks are independent: a failing content check never hides the
//! result of the existence check for the same file.

pub mod predicates;

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use self::predicates::Predicate;

pub const WORKFLOWS_DIR: &str = ".github/workflows";
pub const ZAP_WORKFLOW: &str = "owasp-zap.yml";
pub const ZAP_RULES_FILE: &str = ".zap/rules.tsv";

/// Workflows every pipeline must ship.
pub const REQUIRED_WORKFLOWS: &[&str] = &["sonarqube.yml", "snyk.yml", ZAP_WORKFLOW];

/// Secrets referenced as `${{ secrets.NAME }}` by every required workflow.
pub const REQUIRED_SECRETS: &[&str] = &[
    "SNYK_TOKEN",
    "SONAR_TOKEN",
    "SONAR_HOST_URL",
    "SLACK_BOT_TOKEN",
];

pub const REQUIRED_TRIGGERS: &[&str] = &["push:", "pull_request:"];

const ZAP_STEPS: &[&str] = &[
    "Run OWASP ZAP Baseline Scan",
    "Upload ZAP Report",
    "Check for Critical Vulnerabilities",
];
const ZAP_TARGET: &str = "target: 'http://localhost:3000'";
const ZAP_REPORTS: &[&str] = &["zap-report.html", "zap-report.json", "zap-report.md"];
const ZAP_VULNERABILITY_HANDLING: &[&str] = &[
    "CRITICAL_VULNERABILITIES",
    "riskcode == \"3\"",
    "Send Slack Notification",
    "Create GitHub Issue",
];

/// One `(file, predicate)` assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowCheck {
    pub name: String,
    pub path: PathBuf,
    pub predicate: Predicate,
}

/// The result of evaluating one check.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: String,
    pub path: PathBuf,
    pub passed: bool,
    pub detail: Option<String>,
}

impl WorkflowCheck {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, predicate: Predicate) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            predicate,
        }
    }

    pub fn evaluate(&self, root: &Path) -> CheckOutcome {
        let result = self.predicate.evaluate(&root.join(&self.path));
        debug!(check = %self.name, passed = result.is_ok(), "Check evaluated.");
        CheckOutcome {
            name: self.name.clone(),
            path: self.path.clone(),
            passed: result.is_ok(),
            detail: result.err().map(|e| e.to_string()),
        }
    }
}

fn secret_reference(secret: &str) -> String {
    format!("${{{{ secrets.{secret} }}}}")
}

/// The full battery of pipeline configuration checks.
pub fn default_checks() -> Vec<WorkflowCheck> {
    let mut checks = Vec::new();
    let workflows = Path::new(WORKFLOWS_DIR);

    for workflow in REQUIRED_WORKFLOWS {
        let path = workflows.join(workflow);
        checks.push(WorkflowCheck::new(
            format!("{workflow} exists"),
            &path,
            Predicate::Exists,
        ));
        checks.push(WorkflowCheck::new(
            format!("{workflow} is valid YAML"),
            &path,
            Predicate::ParsesAsYaml,
        ));

        // The ZAP workflow never talks to SonarQube.
        let secrets = REQUIRED_SECRETS
            .iter()
            .filter(|secret| *workflow != ZAP_WORKFLOW || **secret != "SONAR_TOKEN")
            .map(|secret| secret_reference(secret));
        checks.push(WorkflowCheck::new(
            format!("{workflow} references required secrets"),
            &path,
            Predicate::contains_all(secrets),
        ));

        for trigger in REQUIRED_TRIGGERS {
            checks.push(WorkflowCheck::new(
                format!("{workflow} triggers on {}", trigger.trim_end_matches(':')),
                &path,
                Predicate::contains_all([*trigger]),
            ));
        }
    }

    checks.push(WorkflowCheck::new(
        "ZAP rules file exists",
        ZAP_RULES_FILE,
        Predicate::Exists,
    ));
    checks.push(WorkflowCheck::new(
        "ZAP rules format",
        ZAP_RULES_FILE,
        Predicate::ZapRules,
    ));

    let zap = workflows.join(ZAP_WORKFLOW);
    checks.push(WorkflowCheck::new(
        "ZAP scan steps",
        &zap,
        Predicate::contains_all(ZAP_STEPS.iter().copied()),
    ));
    checks.push(WorkflowCheck::new(
        "ZAP scan target",
        &zap,
        Predicate::contains_all([ZAP_TARGET]),
    ));
    checks.push(WorkflowCheck::new(
        "ZAP report files",
        &zap,
        Predicate::contains_all(ZAP_REPORTS.iter().copied()),
    ));
    checks.push(WorkflowCheck::new(
        "ZAP vulnerability handling",
        &zap,
        Predicate::contains_all(ZAP_VULNERABILITY_HANDLING.iter().copied()),
    ));

    checks
}

/// Evaluates every check against the repository at `root`.
pub fn run_checks(root: &Path, checks: &[WorkflowCheck]) -> Vec<CheckOutcome> {
    info!(root = %root.display(), checks = checks.len(), "Running workflow checks.");
    let outcomes: Vec<CheckOutcome> = checks.iter().map(|check| check.evaluate(root)).collect();
    let failed = outcomes.iter().filter(|o| !o.passed).count();
    info!(failed, "Workflow checks finished.");
    outcomes
}
