//! The cleaned reading model and the anomaly filter.
//!
//! Raw rows become [`Reading`]s through a single pass: run both extraction
//! grammars, normalize the timestamp to IST, then drop anything outside the
//! physically plausible visibility band. Each poll rebuilds both series
//! wholesale; readings are never mutated after construction.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::debug;

use crate::extract::{match_general, match_runway, LineMatch};
use crate::source::RawRecord;
use crate::timeparse::parse_timestamp;

/// Lowest physically plausible visibility, meters.
pub const VIS_MIN_M: i64 = 0;

/// Highest physically plausible visibility, meters. Values above this are
/// sensor codes or sentinel junk, not data.
pub const VIS_MAX_M: i64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadingKind {
    GeneralVisibility,
    RunwayVisualRange,
}

/// One cleaned, typed observation. `runway_id` is present exactly when the
/// kind is [`ReadingKind::RunwayVisualRange`]; the constructors enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reading {
    pub timestamp: DateTime<FixedOffset>,
    pub kind: ReadingKind,
    pub runway_id: Option<String>,
    pub visibility_m: i64,
}

impl Reading {
    pub fn general(timestamp: DateTime<FixedOffset>, visibility_m: i64) -> Self {
        Reading {
            timestamp,
            kind: ReadingKind::GeneralVisibility,
            runway_id: None,
            visibility_m,
        }
    }

    pub fn runway(
        timestamp: DateTime<FixedOffset>,
        runway_id: String,
        visibility_m: i64,
    ) -> Self {
        Reading {
            timestamp,
            kind: ReadingKind::RunwayVisualRange,
            runway_id: Some(runway_id),
            visibility_m,
        }
    }

    /// Whether the value sits inside the `[0, 5000]` m plausible band.
    pub fn in_valid_range(&self) -> bool {
        (VIS_MIN_M..=VIS_MAX_M).contains(&self.visibility_m)
    }
}

/// The two cleaned series, replaced as a unit on every poll so a reader
/// never observes one fresh and one stale half.
#[derive(Debug, Default, Serialize)]
pub struct SeriesPair {
    pub general: Vec<Reading>,
    pub runway: Vec<Reading>,
}

/// Builds both cleaned series from raw rows.
///
/// The two grammars run independently per row, so a row carrying both
/// markers contributes one reading to each series. Rows with an
/// unparseable timestamp or a failed extraction are excluded silently;
/// the only observable effect is a shorter series.
pub fn build_series(rows: &[RawRecord]) -> SeriesPair {
    let mut pair = SeriesPair::default();
    let mut dropped_timestamps = 0usize;

    for row in rows {
        let Some(timestamp) = parse_timestamp(&row.timestamp) else {
            dropped_timestamps += 1;
            continue;
        };

        if let LineMatch::Matched { value, .. } = match_general(&row.payload) {
            pair.general.push(Reading::general(timestamp, value));
        }

        if let LineMatch::Matched {
            value,
            runway: Some(runway_id),
        } = match_runway(&row.payload)
        {
            pair.runway.push(Reading::runway(timestamp, runway_id, value));
        }
    }

    if dropped_timestamps > 0 {
        debug!(dropped_timestamps, "Rows dropped for unparseable timestamps");
    }

    filter_anomalies(&mut pair.general);
    filter_anomalies(&mut pair.runway);
    pair
}

/// Drops readings outside the plausible band. Runs per series; the two
/// series never influence each other's inclusion.
pub fn filter_anomalies(series: &mut Vec<Reading>) {
    let before = series.len();
    series.retain(Reading::in_valid_range);
    let dropped = before - series.len();
    if dropped > 0 {
        debug!(dropped, kept = series.len(), "Anomalous readings filtered");
    }
}
