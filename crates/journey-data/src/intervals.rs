//! Housing interval accounting.
//!
//! A client's `housed_date` field is a fixed-layout list of stays:
//!
//! ```text
//! field  = range ( "," range )*
//! range  = date sep date          (21 characters)
//! date   = YYYY-MM-DD             (10 characters)
//! sep    = any single character   (offset 10)
//! ```
//!
//! The start date is the first ten characters of a range and the end date the
//! ten characters after the separator. Nothing else is accepted; in particular
//! whitespace around commas is a malformed date.

use serde::Serialize;
use tracing::{debug, warn};

use journey_core::models::{ClientTotal, Interval, Table};
use journey_core::time_utils::{parse_iso_date, ISO_DATE_LEN};
use journey_core::{JourneyError, Result};

/// Offset of the one-character separator inside a range.
pub const RANGE_SEPARATOR_OFFSET: usize = ISO_DATE_LEN;

/// Width of one `start sep end` range.
pub const RANGE_WIDTH: usize = 2 * ISO_DATE_LEN + 1;

/// Separator between ranges.
pub const RANGE_DELIMITER: char = ',';

pub const CLIENT_COLUMN: &str = "client";
pub const HOUSED_DATE_COLUMN: &str = "housed_date";

// ── Per-client parsing ────────────────────────────────────────────────────────

/// All stays of one client and their summed duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStays {
    pub client: String,
    pub intervals: Vec<Interval>,
    /// Sum of every interval's `duration_days`. Overlapping stays are counted
    /// once per interval.
    pub total_days: i64,
}

/// Parse one client's housing field.
///
/// Returns `Ok(None)` when the field is absent or blank (the client has no
/// housing record). Any malformed or inverted range fails the whole field.
pub fn parse_intervals(client: &str, raw_field: Option<&str>) -> Result<Option<ClientStays>> {
    let Some(field) = raw_field.map(str::trim).filter(|f| !f.is_empty()) else {
        return Ok(None);
    };

    let mut intervals = Vec::new();
    let mut rest = field;
    loop {
        let (range, tail) = split_range(client, rest)?;
        intervals.push(parse_range(client, range)?);

        if tail.is_empty() {
            break;
        }
        match tail.strip_prefix(RANGE_DELIMITER) {
            Some(next) => rest = next,
            None => {
                return Err(JourneyError::MalformedDate {
                    client: client.to_string(),
                    value: tail.to_string(),
                })
            }
        }
    }

    let total_days = intervals.iter().map(|iv| iv.duration_days).sum();
    Ok(Some(ClientStays {
        client: client.to_string(),
        intervals,
        total_days,
    }))
}

/// Split off the leading fixed-width range.
fn split_range<'a>(client: &str, s: &'a str) -> Result<(&'a str, &'a str)> {
    match (s.get(..RANGE_WIDTH), s.get(RANGE_WIDTH..)) {
        (Some(range), Some(tail)) => Ok((range, tail)),
        _ => Err(JourneyError::MalformedDate {
            client: client.to_string(),
            value: s.to_string(),
        }),
    }
}

fn parse_range(client: &str, range: &str) -> Result<Interval> {
    let start_raw = range.get(..ISO_DATE_LEN).unwrap_or(range);
    let end_raw = range.get(RANGE_SEPARATOR_OFFSET + 1..).unwrap_or(range);

    let parse = |raw: &str| {
        parse_iso_date(raw).ok_or_else(|| JourneyError::MalformedDate {
            client: client.to_string(),
            value: raw.to_string(),
        })
    };
    let start = parse(start_raw)?;
    let end = parse(end_raw)?;

    Interval::new(client, start, end).ok_or_else(|| JourneyError::InvertedInterval {
        client: client.to_string(),
        start: start_raw.to_string(),
        end: end_raw.to_string(),
    })
}

// ── Whole-table accounting ────────────────────────────────────────────────────

/// A client whose housing field could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub client: String,
    pub error: String,
}

/// Result of accounting a whole housing table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HousingSummary {
    /// Every interval, in source order.
    pub intervals: Vec<Interval>,
    /// Total days housed per client, in first-seen order.
    pub totals: Vec<ClientTotal>,
    /// Clients skipped because their field was malformed.
    pub failures: Vec<RecordFailure>,
}

impl HousingSummary {
    /// Total for `client`, if it has any parsed stays.
    pub fn total_for(&self, client: &str) -> Option<i64> {
        self.totals
            .iter()
            .find(|t| t.client == client)
            .map(|t| t.total_days_housed)
    }

    fn add(&mut self, stays: ClientStays) {
        match self.totals.iter_mut().find(|t| t.client == stays.client) {
            Some(existing) => existing.total_days_housed += stays.total_days,
            None => self.totals.push(ClientTotal {
                client: stays.client.clone(),
                total_days_housed: stays.total_days,
            }),
        }
        self.intervals.extend(stays.intervals);
    }
}

/// Parse every row of a housing table (`client`, `housed_date`).
///
/// A malformed field only removes that client's row: the error is recorded in
/// [`HousingSummary::failures`] and the remaining rows are still processed.
/// A client appearing on several rows accumulates into one total.
pub fn account_housing(table: &Table) -> Result<HousingSummary> {
    let clients = table.column(CLIENT_COLUMN)?;
    let fields = table.column(HOUSED_DATE_COLUMN)?;

    let mut summary = HousingSummary::default();
    for (client, field) in clients.into_iter().zip(fields) {
        let Some(client) = client else {
            debug!("Skipping housing row without a client name");
            continue;
        };

        match parse_intervals(client, field) {
            Ok(Some(stays)) => summary.add(stays),
            Ok(None) => debug!("No housing record for {}", client),
            Err(e) => {
                warn!("Discarding housing record for {}: {}", client, e);
                summary.failures.push(RecordFailure {
                    client: client.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    debug!(
        "Housing: {} intervals for {} clients, {} failures",
        summary.intervals.len(),
        summary.totals.len(),
        summary.failures.len()
    );
    Ok(summary)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
