// src/core/checks/predicates.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// `ruleId<TAB>action<TAB>description`; extra columns are tolerated.
static RE_ZAP_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\t(IGNORE|FAIL|WARN)\t").expect("valid rules.tsv pattern"));

/// Why a single check did not pass.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing: {}", .0.join(", "))]
    MissingTokens(Vec<String>),

    #[error(
        "line {line_no}: expected `<digits>\\t<IGNORE|FAIL|WARN>\\t<description>`, got {line:?}"
    )]
    InvalidRule { line_no: usize, line: String },
}

/// A read-only assertion over the text of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// The file is present.
    Exists,
    /// The file parses as YAML.
    ParsesAsYaml,
    /// Every token occurs somewhere in the file.
    ContainsAll(Vec<String>),
    /// Every non-blank line is a valid OWASP ZAP rule.
    ZapRules,
}

impl Predicate {
    pub fn contains_all<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::ContainsAll(tokens.into_iter().map(Into::into).collect())
    }

    /// Evaluates the predicate against the file at `path`.
    pub fn evaluate(&self, path: &Path) -> Result<(), CheckError> {
        if !path.is_file() {
            return Err(CheckError::Missing(path.to_path_buf()));
        }
        if matches!(self, Predicate::Exists) {
            return Ok(());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|source| CheckError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        self.evaluate_text(&content)
    }

    /// Evaluates the content-based predicates against already-loaded text.
    pub fn evaluate_text(&self, content: &str) -> Result<(), CheckError> {
        match self {
            Predicate::Exists => Ok(()),
            Predicate::ParsesAsYaml => {
                serde_yaml::from_str::<serde_yaml::Value>(content)?;
                Ok(())
            }
            Predicate::ContainsAll(tokens) => {
                let missing: Vec<String> = tokens
                    .iter()
                    .filter(|token| !content.contains(token.as_str()))
                    .cloned()
                    .collect();
                if missing.is_empty() {
                    Ok(())
                } else {
                    debug!(missing = ?missing, "Tokens not found.");
                    Err(CheckError::MissingTokens(missing))
                }
            }
            Predicate::ZapRules => validate_zap_rules(content),
        }
    }
}

fn validate_zap_rules(content: &str) -> Result<(), CheckError> {
    for (index, line) in content.split('\n').enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if !RE_ZAP_RULE.is_match(line) {
            return Err(CheckError::InvalidRule {
                line_no: index + 1,
                line: line.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_all_reports_every_missing_token() {
        let predicate = Predicate::contains_all(["push:", "pull_request:", "schedule:"]);
        let err = predicate.evaluate_text("on:\n  push:\n").unwrap_err();
        match err {
            CheckError::MissingTokens(missing) => {
                assert_eq!(missing, vec!["pull_request:", "schedule:"])
            }
            other => panic!("expected MissingTokens, got {other:?}"),
        }
    }

    #[test]
    fn yaml_predicate_accepts_workflow_expressions() {
        let workflow = "name: Snyk\non:\n  push:\n    branches: [main]\n\
                        jobs:\n  scan:\n    env:\n      SNYK_TOKEN: ${{ secrets.SNYK_TOKEN }}\n";
        assert!(Predicate::ParsesAsYaml.evaluate_text(workflow).is_ok());
    }

    #[test]
    fn yaml_predicate_rejects_broken_indentation() {
        let broken = "jobs:\n  scan:\n    steps:\n  - run: [unclosed\n";
        assert!(matches!(
            Predicate::ParsesAsYaml.evaluate_text(broken),
            Err(CheckError::Yaml(_))
        ));
    }

    #[test]
    fn zap_rules_accept_known_actions_and_blank_lines() {
        let rules = "10016\tIGNORE\t(Web Browser XSS Protection Not Enabled)\n\n\
                     10020\tWARN\t(X-Frame-Options)\n\
                     40012\tFAIL\t(Cross Site Scripting)\n";
        assert!(Predicate::ZapRules.evaluate_text(rules).is_ok());
    }

    #[test]
    fn zap_rules_reject_unknown_actions() {
        let err = Predicate::ZapRules
            .evaluate_text("10016\tIGNORE\tok\n10020\tBLOCK\tbad\n")
            .unwrap_err();
        assert!(matches!(err, CheckError::InvalidRule { line_no: 2, .. }));
    }

    #[test]
    fn zap_rules_require_numeric_ids_and_a_description_column() {
        assert!(Predicate::ZapRules.evaluate_text("abc\tWARN\tdesc\n").is_err());
        assert!(Predicate::ZapRules.evaluate_text("10020\tWARN\n").is_err());
    }

    #[test]
    fn missing_files_fail_every_predicate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.yml");
        for predicate in [Predicate::Exists, Predicate::ParsesAsYaml, Predicate::ZapRules] {
            assert!(matches!(predicate.evaluate(&path), Err(CheckError::Missing(_))));
        }
    }
}
