//! Row classification and value extraction for visibility log lines.
//!
//! A payload line may carry a general-visibility reading (`GEN. VIS. :0350`),
//! a per-runway visual range reading (`RVR 28 :0075`), both, or neither.
//! The two matchers run independently over the same line, so a line that
//! carries both markers contributes to both series.

/// Marker substring identifying a general-visibility line.
pub const GENERAL_MARKER: &str = "GEN. VIS.";

/// Marker substring identifying a runway visual range line.
pub const RUNWAY_MARKER: &str = "RVR";

/// Outcome of matching one payload against one of the two line grammars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch {
    /// The line matched and yielded a value (and a runway token for RVR lines).
    Matched { value: i64, runway: Option<String> },
    /// The line does not encode a reading of this kind.
    NoMatch,
}

/// Matches the general-visibility grammar: the marker, at least one
/// whitespace character, a colon, and a base-10 digit run.
///
/// A payload that contains the marker but not the full pattern is a
/// malformed row and yields [`LineMatch::NoMatch`]; callers drop it rather
/// than defaulting the value.
pub fn match_general(payload: &str) -> LineMatch {
    for (idx, _) in payload.match_indices(GENERAL_MARKER) {
        let tail = &payload[idx + GENERAL_MARKER.len()..];
        if let Some(value) = general_tail(tail) {
            return LineMatch::Matched {
                value,
                runway: None,
            };
        }
    }
    LineMatch::NoMatch
}

/// Matches the runway grammar: `RVR`, whitespace, an alphanumeric runway
/// token, whitespace, a colon, and a base-10 digit run.
pub fn match_runway(payload: &str) -> LineMatch {
    for (idx, _) in payload.match_indices(RUNWAY_MARKER) {
        let tail = &payload[idx + RUNWAY_MARKER.len()..];
        if let Some((runway, value)) = runway_tail(tail) {
            return LineMatch::Matched {
                value,
                runway: Some(runway),
            };
        }
    }
    LineMatch::NoMatch
}

fn general_tail(tail: &str) -> Option<i64> {
    let rest = eat_whitespace(tail)?;
    let rest = rest.strip_prefix(':')?;
    let (value, _) = eat_digits(rest)?;
    Some(value)
}

fn runway_tail(tail: &str) -> Option<(String, i64)> {
    let rest = eat_whitespace(tail)?;
    let token_end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if token_end == 0 {
        return None;
    }
    let token = &rest[..token_end];
    let rest = eat_whitespace(&rest[token_end..])?;
    let rest = rest.strip_prefix(':')?;
    let (value, _) = eat_digits(rest)?;
    Some((token.to_string(), value))
}

/// Consumes at least one whitespace character, or fails.
fn eat_whitespace(s: &str) -> Option<&str> {
    let rest = s.trim_start();
    if rest.len() == s.len() {
        return None;
    }
    Some(rest)
}

/// Consumes a run of ASCII digits and parses it as a base-10 integer.
/// A run too long to represent is a parse failure, not a panic.
fn eat_digits(s: &str) -> Option<(i64, &str)> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let value = s[..end].parse::<i64>().ok()?;
    Some((value, &s[end..]))
}
