//! JSON export of the run report.
//!
//! The report carries everything the run produced (collected articles, the
//! news summary blocks, the draft, and the final article) together with the
//! models used and the local start time.

use crate::models::RunReport;
use crate::utils::slugify_title;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `report` to `{output_dir}/{local_date}/{topic-slug}.json`.
///
/// Returns the written path.
///
/// # Errors
///
/// Fails if the directory cannot be created or the file cannot be written.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_report(report: &RunReport, output_dir: &str) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    let full_json_dir = format!("{}/{}", output_dir.trim_end_matches('/'), report.local_date);
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(%full_json_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = format!("{}/{}.json", full_json_dir, slugify_title(&report.topic));
    fs::write(&path, json).await?;
    info!(%path, bytes = report.article.len(), "Wrote run report");

    Ok(path)
}
