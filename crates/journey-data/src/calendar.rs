//! Daily check-in calendar for the journey heatmap.
//!
//! Each check-in is weighted by its program label, two sentinel days bound the
//! observed range and weights are summed per day. Days where several
//! contributions collide are folded into a small fixed range by
//! [`remap_sum`]; a day with a single contribution keeps its weight, so a lone
//! trailing sentinel stays at 60.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use tracing::{debug, warn};

use journey_core::models::{CalendarBucket, Table};
use journey_core::time_utils::normalize_date_like;
use journey_core::{JourneyError, Result};

/// Case-insensitive substring marking a day-program check-in.
pub const DAY_MARKER: &str = "day";
/// Weight of a day-program check-in.
pub const DAY_WEIGHT: i64 = 1;
/// Weight of any other check-in, including one without a program label.
pub const NIGHT_WEIGHT: i64 = 30;
/// Weight of the synthetic day before the first check-in.
pub const LEADING_SENTINEL_WEIGHT: i64 = 1;
/// Weight of the synthetic day after the last check-in.
pub const TRAILING_SENTINEL_WEIGHT: i64 = 60;

/// A day holding exactly one day and one night check-in.
pub const COLLISION_SUM: i64 = 31;
pub const COLLISION_VALUE: i64 = 15;
/// Sums above this are clamped to [`CLAMP_VALUE`].
pub const CLAMP_THRESHOLD: i64 = 35;
pub const CLAMP_VALUE: i64 = 30;

pub const SLEEP_COLUMN: &str = "Sleep";
pub const PROGRAM_COLUMN: &str = "Program";

// ── Events ────────────────────────────────────────────────────────────────────

/// One check-in, already normalised to a calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIn {
    pub date: NaiveDate,
    pub program: Option<String>,
}

impl CheckIn {
    pub fn new(date: NaiveDate, program: Option<&str>) -> Self {
        Self {
            date,
            program: program.map(str::to_string),
        }
    }
}

/// Read check-ins from a `Sleep` / `Program` table.
///
/// Rows with a null `Sleep` cell are skipped. A non-null cell that is not a
/// recognisable date fails the whole table for `client`.
pub fn check_ins_from_table(client: &str, table: &Table) -> Result<Vec<CheckIn>> {
    let dates = table.column(SLEEP_COLUMN)?;
    let programs = table.column(PROGRAM_COLUMN)?;

    let mut events = Vec::with_capacity(table.len());
    for (raw_date, program) in dates.into_iter().zip(programs) {
        let Some(raw_date) = raw_date else {
            debug!("Skipping check-in without a date for {}", client);
            continue;
        };
        let date = normalize_date_like(raw_date).ok_or_else(|| JourneyError::MalformedDate {
            client: client.to_string(),
            value: raw_date.to_string(),
        })?;
        events.push(CheckIn::new(date, program));
    }
    Ok(events)
}

// ── Rules ─────────────────────────────────────────────────────────────────────

/// Weight of a check-in by its program label.
pub fn classify_program(program: Option<&str>) -> i64 {
    match program {
        Some(label) if label.to_lowercase().contains(DAY_MARKER) => DAY_WEIGHT,
        _ => NIGHT_WEIGHT,
    }
}

/// Fold a daily weight sum into the heat scale: exactly 31 becomes 15, above
/// 35 becomes 30, anything else is unchanged.
pub fn remap_sum(sum: i64) -> i64 {
    if sum == COLLISION_SUM {
        COLLISION_VALUE
    } else if sum > CLAMP_THRESHOLD {
        CLAMP_VALUE
    } else {
        sum
    }
}

// ── Bucketing ─────────────────────────────────────────────────────────────────

/// Build the calendar: one bucket per distinct day, ascending.
///
/// The day before the earliest check-in and the day after the latest always
/// appear. Days with more than one contribution (sentinels included) go
/// through [`remap_sum`]. No check-ins yields no buckets.
///
/// A sentinel that would fall outside chrono's date range is omitted with a
/// warning.
pub fn bucketize(events: &[CheckIn]) -> Vec<CalendarBucket> {
    let mut weighted: Vec<(NaiveDate, i64)> = events
        .iter()
        .map(|e| (e.date, classify_program(e.program.as_deref())))
        .collect();

    let (Some(min_date), Some(max_date)) = (
        events.iter().map(|e| e.date).min(),
        events.iter().map(|e| e.date).max(),
    ) else {
        return Vec::new();
    };

    match min_date.checked_sub_days(Days::new(1)) {
        Some(before) => weighted.push((before, LEADING_SENTINEL_WEIGHT)),
        None => warn!("No day before {}; leading sentinel omitted", min_date),
    }
    match max_date.checked_add_days(Days::new(1)) {
        Some(after) => weighted.push((after, TRAILING_SENTINEL_WEIGHT)),
        None => warn!("No day after {}; trailing sentinel omitted", max_date),
    }

    // (sum, contributions) per day
    let mut sums: BTreeMap<NaiveDate, (i64, usize)> = BTreeMap::new();
    for (date, weight) in weighted {
        let slot = sums.entry(date).or_insert((0, 0));
        slot.0 += weight;
        slot.1 += 1;
    }

    debug!(
        "Calendar: {} check-ins over {} days ({} to {})",
        events.len(),
        sums.len(),
        min_date,
        max_date
    );

    sums.into_iter()
        .map(|(date, (sum, contributions))| CalendarBucket {
            date,
            value: if contributions > 1 { remap_sum(sum) } else { sum },
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
