//! JSON export of the current session.
//!
//! The file is a snapshot for other tools; nothing reads it back.

use crate::error::Result;
use crate::models::{SearchResult, Summary};
use serde::Serialize;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
struct SessionExport<'a> {
    search: &'a SearchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a Summary>,
}

/// Write `{json_output_dir}/session.json`.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_session(
    json_output_dir: &str,
    result: &SearchResult,
    summary: Option<&Summary>,
) -> Result<String> {
    let json = serde_json::to_string_pretty(&SessionExport {
        search: result,
        summary,
    })?;

    let path = format!("{}/session.json", json_output_dir.trim_end_matches('/'));
    info!(%path, "Writing JSON");
    fs::write(&path, json).await?;
    info!(%path, "Wrote session JSON");
    Ok(path)
}
