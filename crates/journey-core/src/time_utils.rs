use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::warn;

/// Width of one calendar date in the `YYYY-MM-DD` form.
pub const ISO_DATE_LEN: usize = 10;

// ── Strict ISO dates ──────────────────────────────────────────────────────────

/// Parse exactly `YYYY-MM-DD`: ten ASCII characters, zero-padded, dashes at
/// positions 4 and 7, and a real calendar day.
///
/// Returns `None` for anything else, including surrounding whitespace.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    if bytes.len() != ISO_DATE_LEN {
        return None;
    }
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

// ── Loose date-like values ────────────────────────────────────────────────────

/// Normalise a date-like cell to a calendar day, dropping any time component.
///
/// Handles RFC 3339 timestamps (the offset is discarded, the local date is
/// kept), naive date-times with `T` or space separators, and the common
/// date-only spellings found in spreadsheet exports.
pub fn normalize_date_like(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let normalised = if let Some(stripped) = s.strip_suffix('Z') {
        format!("{}+00:00", stripped)
    } else {
        s.to_string()
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
        return Some(dt.date_naive());
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.date());
        }
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y", "%B %d, %Y"];
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    warn!("could not parse date-like value \"{}\"", s);
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────
