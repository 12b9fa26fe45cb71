//! Timestamp normalization to India Standard Time.
//!
//! Log timestamps arrive either with an explicit offset or as naive
//! wall-clock strings. Naive timestamps are always taken as UTC (never the
//! machine's local zone, to keep runs deterministic) and every instant is
//! re-expressed in IST before any comparison or display.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// IST offset from UTC, in seconds (+05:30).
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// The fixed IST zone. The offset is a valid constant.
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap()
}

/// Parses a raw timestamp string and normalizes it to IST.
///
/// Accepts RFC 3339 strings (any offset) and the naive formats
/// `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS`, which are interpreted as
/// UTC. Returns `None` for anything else; the caller drops the row.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(to_ist(dt));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(to_ist(naive.and_utc().fixed_offset()));
        }
    }

    None
}

/// Re-expresses an instant in IST. Idempotent: converting an already-IST
/// instant is a no-op.
pub fn to_ist(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    dt.with_timezone(&ist())
}
