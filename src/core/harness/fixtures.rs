// src/core/harness/fixtures.rs

use super::workspace::{FileSink, Workspace};
use crate::core::error::HarnessError;
use crate::core::registry::ScenarioDetail;
use tracing::{debug, info};

/// Writes the scenario's fixture files into the workspace.
///
/// Existing files with the same name are overwritten. The contents are the
/// scenario's literal data; nothing is templated. The first I/O error aborts
/// the materialization and is returned unchanged.
pub fn materialize(
    detail: &ScenarioDetail,
    workspace: &Workspace,
    sink: &impl FileSink,
) -> Result<(), HarnessError> {
    info!(scenario = %detail.scenario, files = detail.fixtures.len(), "Materializing fixture.");
    for fixture in detail.fixtures {
        let path = workspace.join(fixture.path);
        debug!(path = %path.display(), bytes = fixture.contents.len(), "Writing fixture file.");
        sink.write(&path, fixture.contents.as_bytes())
            .map_err(|source| HarnessError::Fixture { path, source })?;
    }
    Ok(())
}
