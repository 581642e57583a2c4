//! The static registry of security-test scenarios.
//!
//! Every scenario the harness can run is declared here: a closed enum for the
//! names and one `ScenarioDetail` per variant holding the fixture files, the
//! external command and the remediation hints printed when a run fails.
//! Adding a test type means adding a variant and its detail entry.

use crate::core::error::HarnessError;
use crate::core::models::{FixtureFile, ToolCommand};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// The registered scenarios, in the order they are listed to operators.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Build a container from an outdated base image and scan it.
    Docker,
    /// Audit a package manifest pinned to vulnerable releases.
    Dependencies,
    /// Lint a source file that reflects user input into HTML.
    Code,
}

/// Everything the harness needs to run one scenario.
#[derive(Debug)]
pub struct ScenarioDetail {
    pub scenario: Scenario,
    /// Human-readable description, printed when the run starts.
    pub description: &'static str,
    /// Files written into the workspace before the command runs.
    pub fixtures: &'static [FixtureFile],
    /// The external tool invocation.
    pub command: ToolCommand,
    /// Steps the operator can take when the run fails.
    pub remediation: &'static [&'static str],
}

const DOCKERFILE: &str = r#"FROM node:10
RUN apt-get update && apt-get install -y curl
COPY . .
CMD ["node", "app.js"]"#;

const PACKAGE_JSON: &str = r#"{
  "name": "vulnerable-app",
  "version": "1.0.0",
  "dependencies": {
    "express": "4.16.0",
    "lodash": "4.17.4"
  }
}"#;

const APP_JS: &str = r#"const express = require('express');
const app = express();

app.get('/user', (req, res) => {
  const userInput = req.query.input;
  res.send(`<div>${userInput}</div>`);
});

app.listen(3000);"#;

static DOCKER: ScenarioDetail = ScenarioDetail {
    scenario: Scenario::Docker,
    description: "Docker security testing",
    fixtures: &[FixtureFile { path: "Dockerfile", contents: DOCKERFILE }],
    command: ToolCommand {
        steps: &[
            &["docker", "build", "-t", "test-image", "."],
            &["trivy", "image", "test-image"],
        ],
    },
    remediation: &[
        "Verify the Docker daemon is running and `docker` is on PATH",
        "Install Trivy and confirm `trivy --version` works",
        "Review the image findings above and move the base image off `node:10`",
    ],
};

static DEPENDENCIES: ScenarioDetail = ScenarioDetail {
    scenario: Scenario::Dependencies,
    description: "Dependency security testing",
    fixtures: &[FixtureFile { path: "package.json", contents: PACKAGE_JSON }],
    command: ToolCommand {
        steps: &[&["npm", "audit"]],
    },
    remediation: &[
        "Verify `npm` is installed and the registry is reachable",
        "Review the advisories above for `express` and `lodash`",
        "Upgrade the flagged packages or run `npm audit fix`",
    ],
};

static CODE: ScenarioDetail = ScenarioDetail {
    scenario: Scenario::Code,
    description: "Code security testing",
    fixtures: &[FixtureFile { path: "app.js", contents: APP_JS }],
    command: ToolCommand {
        steps: &[&["eslint", "--rule", "no-eval: error", "app.js"]],
    },
    remediation: &[
        "Verify `eslint` is installed and on PATH",
        "Review the rule violations reported for app.js",
        "Escape user input before reflecting it into HTML responses",
    ],
};

impl Scenario {
    /// The static detail entry for this scenario.
    pub fn detail(self) -> &'static ScenarioDetail {
        match self {
            Scenario::Docker => &DOCKER,
            Scenario::Dependencies => &DEPENDENCIES,
            Scenario::Code => &CODE,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Names of all registered scenarios, in registry order.
pub fn available_names() -> Vec<&'static str> {
    Scenario::iter().map(Scenario::name).collect()
}

/// Every registered scenario detail, in registry order.
pub fn all() -> impl Iterator<Item = &'static ScenarioDetail> {
    Scenario::iter().map(Scenario::detail)
}

/// Resolves a scenario by its exact name.
///
/// An unknown name yields `HarnessError::UnknownScenario` carrying the list of
/// valid names, so the caller can print it as-is.
pub fn lookup(name: &str) -> Result<Scenario, HarnessError> {
    name.parse::<Scenario>().map_err(|_| HarnessError::UnknownScenario {
        name: name.to_string(),
        available: available_names(),
    })
}
