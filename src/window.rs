//! Window selection and summary aggregation over the cleaned series.
//!
//! "Now" is data-defined: the latest ingested general-visibility timestamp,
//! never the wall clock, so replaying a historical log reproduces the same
//! windows. Every invocation is an independent, total recomputation.

use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;
use std::str::FromStr;

use crate::engine::EngineError;
use crate::series::{Reading, SeriesPair};

/// Recognized lookback durations for the sliding window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Lookback {
    SixHours,
    #[default]
    TwentyFourHours,
    SevenDays,
}

impl Lookback {
    pub fn duration(self) -> Duration {
        match self {
            Lookback::SixHours => Duration::hours(6),
            Lookback::TwentyFourHours => Duration::hours(24),
            Lookback::SevenDays => Duration::hours(168),
        }
    }

    /// Display label passed through to the presentation layer.
    pub fn label(self) -> &'static str {
        match self {
            Lookback::SixHours => "6 Hours",
            Lookback::TwentyFourHours => "24 Hours",
            Lookback::SevenDays => "7 Days",
        }
    }
}

impl FromStr for Lookback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "6h" | "6 hours" => Ok(Lookback::SixHours),
            "24h" | "24 hours" => Ok(Lookback::TwentyFourHours),
            "7d" | "7 days" => Ok(Lookback::SevenDays),
            other => Err(format!(
                "unrecognized lookback '{other}' (expected 6h, 24h, or 7d)"
            )),
        }
    }
}

/// Fog severity bucket derived from current general visibility. Band upper
/// bounds are inclusive: Dense <= 50 m < Moderate <= 200 m < Shallow
/// <= 500 m < Clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FogCategory {
    Dense,
    Moderate,
    Shallow,
    Clear,
}

impl FogCategory {
    pub fn from_visibility(visibility_m: i64) -> Self {
        if visibility_m <= 50 {
            FogCategory::Dense
        } else if visibility_m <= 200 {
            FogCategory::Moderate
        } else if visibility_m <= 500 {
            FogCategory::Shallow
        } else {
            FogCategory::Clear
        }
    }
}

/// Summary metrics over one window. Stateless, recomputed per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowSummary {
    /// Value of the chronologically last in-window general reading, 0 if none.
    pub latest_general_vis: i64,
    /// Worst runway value at the latest runway report instant in-window,
    /// 0 if the runway window is empty (informational, not an error).
    pub min_current_rvr: i64,
    /// Mean general visibility over the window; `None` marks an undefined
    /// mean (empty window) rather than a NaN or a panic.
    pub period_mean_general_vis: Option<i64>,
    pub fog_category: FogCategory,
}

impl WindowSummary {
    /// Display form of the period mean: undefined renders as 0.
    pub fn period_mean_display(&self) -> i64 {
        self.period_mean_general_vis.unwrap_or(0)
    }
}

/// Everything the presentation layer consumes: the two in-window series,
/// the summary, and the pass-through latest timestamp and lookback label.
#[derive(Debug, Serialize)]
pub struct WindowView {
    pub latest_timestamp: DateTime<FixedOffset>,
    pub lookback: Lookback,
    pub lookback_label: &'static str,
    pub cutoff: DateTime<FixedOffset>,
    pub general: Vec<Reading>,
    pub runway: Vec<Reading>,
    pub summary: WindowSummary,
}

/// Selects the in-window subsequences and derives the summary.
///
/// The general series defines "now"; if it is empty the window is
/// undefined and this fails with [`EngineError::EmptySeriesPrecondition`].
/// An empty runway window is a plain zero-valued state, not a failure.
pub fn select(pair: &SeriesPair, lookback: Lookback) -> Result<WindowView, EngineError> {
    let latest_timestamp = pair
        .general
        .iter()
        .map(|r| r.timestamp)
        .max()
        .ok_or(EngineError::EmptySeriesPrecondition)?;

    let cutoff = latest_timestamp - lookback.duration();

    let general: Vec<Reading> = pair
        .general
        .iter()
        .filter(|r| r.timestamp >= cutoff)
        .cloned()
        .collect();
    let runway: Vec<Reading> = pair
        .runway
        .iter()
        .filter(|r| r.timestamp >= cutoff)
        .cloned()
        .collect();

    let latest_general_vis = general.last().map(|r| r.visibility_m).unwrap_or(0);
    let min_current_rvr = min_rvr_at_latest_instant(&runway);
    let period_mean_general_vis = period_mean(&general);

    Ok(WindowView {
        latest_timestamp,
        lookback,
        lookback_label: lookback.label(),
        cutoff,
        summary: WindowSummary {
            latest_general_vis,
            min_current_rvr,
            period_mean_general_vis,
            fog_category: FogCategory::from_visibility(latest_general_vis),
        },
        general,
        runway,
    })
}

/// The critical runway reading: minimum value among readings at the single
/// latest runway timestamp in the window, not the window-wide minimum.
fn min_rvr_at_latest_instant(runway: &[Reading]) -> i64 {
    let Some(latest) = runway.iter().map(|r| r.timestamp).max() else {
        return 0;
    };
    runway
        .iter()
        .filter(|r| r.timestamp == latest)
        .map(|r| r.visibility_m)
        .min()
        .unwrap_or(0)
}

fn period_mean(general: &[Reading]) -> Option<i64> {
    if general.is_empty() {
        return None;
    }
    let sum: i64 = general.iter().map(|r| r.visibility_m).sum();
    Some((sum as f64 / general.len() as f64) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Reading;
    use crate::timeparse::ist;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<FixedOffset> {
        ist().with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn pair(general: Vec<Reading>, runway: Vec<Reading>) -> SeriesPair {
        SeriesPair { general, runway }
    }

    #[test]
    fn test_fog_category_boundaries() {
        assert_eq!(FogCategory::from_visibility(50), FogCategory::Dense);
        assert_eq!(FogCategory::from_visibility(51), FogCategory::Moderate);
        assert_eq!(FogCategory::from_visibility(200), FogCategory::Moderate);
        assert_eq!(FogCategory::from_visibility(201), FogCategory::Shallow);
        assert_eq!(FogCategory::from_visibility(500), FogCategory::Shallow);
        assert_eq!(FogCategory::from_visibility(501), FogCategory::Clear);
        assert_eq!(FogCategory::from_visibility(0), FogCategory::Dense);
    }

    #[test]
    fn test_lookback_labels_and_default() {
        assert_eq!(Lookback::default(), Lookback::TwentyFourHours);
        assert_eq!(Lookback::SixHours.label(), "6 Hours");
        assert_eq!("7d".parse::<Lookback>().unwrap(), Lookback::SevenDays);
        assert_eq!(
            "24 Hours".parse::<Lookback>().unwrap(),
            Lookback::TwentyFourHours
        );
        assert!("48h".parse::<Lookback>().is_err());
    }

    #[test]
    fn test_empty_general_series_is_a_precondition_failure() {
        let p = pair(vec![], vec![Reading::runway(ts(15, 0), "28".into(), 75)]);
        let err = select(&p, Lookback::default()).unwrap_err();
        assert!(matches!(err, EngineError::EmptySeriesPrecondition));
    }

    #[test]
    fn test_cutoff_excludes_older_readings() {
        let p = pair(
            vec![
                Reading::general(ts(14, 6), 800),  // > 24h before latest
                Reading::general(ts(15, 8), 400),
                Reading::general(ts(15, 10), 300),
            ],
            vec![],
        );
        let view = select(&p, Lookback::TwentyFourHours).unwrap();

        assert_eq!(view.latest_timestamp, ts(15, 10));
        assert_eq!(view.cutoff, ts(14, 10));
        assert_eq!(view.general.len(), 2);
        assert!(view
            .general
            .iter()
            .all(|r| r.timestamp >= view.cutoff && r.timestamp <= view.latest_timestamp));
    }

    #[test]
    fn test_monotonic_widening() {
        let p = pair(
            vec![
                Reading::general(ts(9, 10), 900),
                Reading::general(ts(14, 20), 700),
                Reading::general(ts(15, 6), 300),
                Reading::general(ts(15, 10), 200),
            ],
            vec![],
        );

        let six = select(&p, Lookback::SixHours).unwrap().general;
        let day = select(&p, Lookback::TwentyFourHours).unwrap().general;
        let week = select(&p, Lookback::SevenDays).unwrap().general;

        assert!(six.iter().all(|r| day.contains(r)));
        assert!(day.iter().all(|r| week.contains(r)));
        assert_eq!(six.len(), 2);
        assert_eq!(day.len(), 3);
        assert_eq!(week.len(), 4);
    }

    #[test]
    fn test_summary_metrics() {
        let p = pair(
            vec![
                Reading::general(ts(15, 8), 100),
                Reading::general(ts(15, 10), 45),
            ],
            vec![
                Reading::runway(ts(15, 9), "28".into(), 300),
                Reading::runway(ts(15, 10), "28".into(), 120),
                Reading::runway(ts(15, 10), "29L".into(), 90),
            ],
        );
        let view = select(&p, Lookback::TwentyFourHours).unwrap();

        assert_eq!(view.summary.latest_general_vis, 45);
        // Min over the latest runway instant only, not the whole window
        assert_eq!(view.summary.min_current_rvr, 90);
        assert_eq!(view.summary.period_mean_general_vis, Some(72));
        assert_eq!(view.summary.fog_category, FogCategory::Dense);
    }

    #[test]
    fn test_window_wide_rvr_minimum_is_not_used() {
        let p = pair(
            vec![Reading::general(ts(15, 10), 600)],
            vec![
                Reading::runway(ts(15, 8), "28".into(), 10),
                Reading::runway(ts(15, 10), "28".into(), 450),
            ],
        );
        let view = select(&p, Lookback::TwentyFourHours).unwrap();
        assert_eq!(view.summary.min_current_rvr, 450);
    }

    #[test]
    fn test_empty_runway_window_is_informational_zero() {
        let p = pair(vec![Reading::general(ts(15, 10), 600)], vec![]);
        let view = select(&p, Lookback::TwentyFourHours).unwrap();
        assert_eq!(view.summary.min_current_rvr, 0);
        assert!(view.runway.is_empty());
    }

    #[test]
    fn test_period_mean_display_of_undefined_is_zero() {
        let summary = WindowSummary {
            latest_general_vis: 0,
            min_current_rvr: 0,
            period_mean_general_vis: None,
            fog_category: FogCategory::Dense,
        };
        assert_eq!(summary.period_mean_display(), 0);
    }

    #[test]
    fn test_latest_reading_always_in_window() {
        let p = pair(vec![Reading::general(ts(15, 10), 250)], vec![]);
        let view = select(&p, Lookback::SixHours).unwrap();
        assert_eq!(view.general.len(), 1);
        assert_eq!(view.summary.latest_general_vis, 250);
        assert_eq!(view.summary.fog_category, FogCategory::Shallow);
    }
}
