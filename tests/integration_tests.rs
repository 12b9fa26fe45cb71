use fog_log_tracker::engine::{Engine, EngineError, Refresh};
use fog_log_tracker::series::{Reading, ReadingKind};
use fog_log_tracker::source::{parse_csv_records, InMemorySource};
use fog_log_tracker::timeparse::ist;
use fog_log_tracker::window::{FogCategory, Lookback};
use chrono::TimeZone;

fn fixture_engine() -> Engine {
    let bytes = include_bytes!("fixtures/sample_log.csv");
    let rows = parse_csv_records(bytes).expect("Failed to read fixture CSV");
    Engine::new(Box::new(InMemorySource(rows)))
}

#[tokio::test]
async fn test_full_pipeline_default_window() {
    let mut engine = fixture_engine();
    let view = engine
        .view(Lookback::default(), Refresh::Always)
        .await
        .unwrap();

    // "Now" is data-defined: the latest general reading, in IST
    assert_eq!(
        view.latest_timestamp,
        ist().with_ymd_and_hms(2024, 1, 15, 6, 30, 0).unwrap()
    );
    assert_eq!(view.lookback_label, "24 Hours");

    // 9999 (anomaly), :abc (malformed), and garbage-time rows are gone;
    // the Jan 12 reading falls outside the 24h window
    assert_eq!(view.general.len(), 3);
    assert_eq!(view.runway.len(), 4);

    assert_eq!(view.summary.latest_general_vis, 45);
    assert_eq!(view.summary.fog_category, FogCategory::Dense);
    // Worst runway at the latest runway instant: min(60, 110)
    assert_eq!(view.summary.min_current_rvr, 60);
    // mean(900, 350, 45) truncated
    assert_eq!(view.summary.period_mean_general_vis, Some(431));
}

#[tokio::test]
async fn test_all_window_readings_inside_bounds() {
    let mut engine = fixture_engine();

    for lookback in [Lookback::SixHours, Lookback::TwentyFourHours, Lookback::SevenDays] {
        let view = engine.view(lookback, Refresh::Always).await.unwrap();
        let cutoff = view.latest_timestamp - lookback.duration();

        for r in view.general.iter().chain(view.runway.iter()) {
            assert!(r.timestamp >= cutoff);
            assert!(r.timestamp <= view.latest_timestamp);
            assert!((0..=5000).contains(&r.visibility_m));
        }
    }
}

#[tokio::test]
async fn test_windows_widen_monotonically() {
    let mut engine = fixture_engine();

    let six = engine
        .view(Lookback::SixHours, Refresh::Always)
        .await
        .unwrap();
    let day = engine
        .view(Lookback::TwentyFourHours, Refresh::Always)
        .await
        .unwrap();
    let week = engine
        .view(Lookback::SevenDays, Refresh::Always)
        .await
        .unwrap();

    assert!(six.general.iter().all(|r| day.general.contains(r)));
    assert!(day.general.iter().all(|r| week.general.contains(r)));
    // The Jan 12 reading only appears at the widest lookback
    assert_eq!(week.general.len(), day.general.len() + 1);
}

#[tokio::test]
async fn test_runway_id_invariant() {
    let mut engine = fixture_engine();
    let pair = engine.poll(Refresh::Always).await.unwrap();

    for r in &pair.general {
        assert_eq!(r.kind, ReadingKind::GeneralVisibility);
        assert!(r.runway_id.is_none());
    }
    for r in &pair.runway {
        assert_eq!(r.kind, ReadingKind::RunwayVisualRange);
        assert!(!r.runway_id.as_deref().unwrap_or("").is_empty());
    }
}

#[tokio::test]
async fn test_general_scenario_round_trip() {
    let rows = parse_csv_records(
        b"Timestamp,Data_Row\n2024-01-15 00:00:00,IGI DEL GEN. VIS. :0350 TREND\n",
    )
    .unwrap();
    let mut engine = Engine::new(Box::new(InMemorySource(rows)));
    let pair = engine.poll(Refresh::Always).await.unwrap();

    assert_eq!(
        pair.general,
        vec![Reading::general(
            ist().with_ymd_and_hms(2024, 1, 15, 5, 30, 0).unwrap(),
            350
        )]
    );
}

#[tokio::test]
async fn test_rvr_only_log_fails_precondition() {
    let rows = parse_csv_records(b"Timestamp,Data_Row\n2024-01-15 00:00:00,RVR 28 :0075\n").unwrap();
    let mut engine = Engine::new(Box::new(InMemorySource(rows)));

    let err = engine
        .view(Lookback::default(), Refresh::Always)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::EmptySeriesPrecondition));
}
