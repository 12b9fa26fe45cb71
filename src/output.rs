//! Output formatting and persistence for window views.
//!
//! Supports pretty-printing, JSON serialization for the presentation
//! layer, and CSV append of summary rows.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::window::{FogCategory, WindowView};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs a window view using Rust's debug pretty-print format.
pub fn print_pretty(view: &WindowView) {
    debug!("{:#?}", view);
}

/// Logs a window view as pretty-printed JSON.
pub fn print_json(view: &WindowView) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(view)?);
    Ok(())
}

/// One flattened summary row for CSV persistence.
#[derive(Serialize)]
struct SummaryRow {
    latest_timestamp: String,
    lookback: &'static str,
    latest_general_vis: i64,
    min_current_rvr: i64,
    period_mean_general_vis: i64,
    fog_category: FogCategory,
}

/// Appends a window summary as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_summary(path: &str, view: &WindowView) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV summary row");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(SummaryRow {
        latest_timestamp: view.latest_timestamp.to_rfc3339(),
        lookback: view.lookback_label,
        latest_general_vis: view.summary.latest_general_vis,
        min_current_rvr: view.summary.min_current_rvr,
        period_mean_general_vis: view.summary.period_mean_display(),
        fog_category: view.summary.fog_category,
    })?;
    writer.flush()?;

    Ok(())
}
