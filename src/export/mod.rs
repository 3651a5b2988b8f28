use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub mod json_exporter;

use crate::error::{ScraperError, ScraperResult};
use crate::model::LeagueEventsList;

/// Export statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    pub leagues: usize,
    pub events: usize,
    pub bytes_written: u64,
}

/// Overwrite `output_path` with the cycle's leagues as a JSON object keyed by
/// league name
pub async fn export_leagues<P: AsRef<Path>>(
    output_path: P,
    leagues: &[LeagueEventsList],
) -> ScraperResult<ExportStats> {
    let output_path = output_path.as_ref();
    debug!("Exporting {} leagues to {}", leagues.len(), output_path.display());

    let rendered = json_exporter::render_leagues(leagues)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            ScraperError::export(format!("Cannot create {}: {}", parent.display(), e))
        })?;
    }

    tokio::fs::write(output_path, &rendered.bytes).await.map_err(|e| {
        ScraperError::export(format!("Cannot write {}: {}", output_path.display(), e))
    })?;

    Ok(ExportStats {
        leagues: rendered.leagues,
        events: rendered.events,
        bytes_written: rendered.bytes.len() as u64,
    })
}
