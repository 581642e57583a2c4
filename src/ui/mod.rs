// src/ui/mod.rs

use crate::app::RunSummary;
use crate::core::checks::CheckOutcome;
use crate::core::models::Outcome;
use crate::core::registry::ScenarioDetail;
use crossterm::style::Stylize;

/// Renders the `list` output: one line per scenario with its command.
pub fn render_scenarios<'a>(details: impl IntoIterator<Item = &'a ScenarioDetail>) -> String {
    details
        .into_iter()
        .map(|detail| {
            let name = format!("{:<14}", detail.scenario.name()).bold();
            format!(
                "{name}{}\n{:<14}$ {}\n",
                detail.description, "", detail.command
            )
        })
        .collect()
}

/// Renders one line per check followed by a pass/fail tally.
pub fn render_checks(outcomes: &[CheckOutcome]) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        let icon = if outcome.passed {
            "✓".green()
        } else {
            "✗".red()
        };
        out.push_str(&format!("{icon} {}", outcome.name));
        if let Some(detail) = &outcome.detail {
            out.push_str(&format!(" ({})", detail.as_str().dark_grey()));
        }
        out.push('\n');
    }

    let failed = outcomes.iter().filter(|o| !o.passed).count();
    let passed = outcomes.len() - failed;
    let tally = format!("{passed} passed, {failed} failed");
    let tally = if failed == 0 {
        tally.green()
    } else {
        tally.red()
    };
    out.push_str(&format!("\n{tally}\n"));
    out
}

/// The closing lines of a scenario run.
pub fn render_summary(summary: &RunSummary) -> String {
    let verdict = match summary.outcome {
        Outcome::Success => format!("{}", "Test completed successfully!".green()),
        Outcome::Failed => {
            let reason = summary
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            format!("{} {reason}", "Test failed:".red())
        }
    };
    format!(
        "\n{verdict}\nReport generated: {}\n",
        summary.report_path.display()
    )
}
