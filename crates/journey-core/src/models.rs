use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{JourneyError, Result};

/// Cell spellings that decode as null, matching common spreadsheet exports.
pub const NULL_MARKERS: &[&str] = &[
    "", "NaN", "nan", "-NaN", "NA", "N/A", "n/a", "#N/A", "NULL", "null", "None", "<NA>",
];

/// A single nullable table cell.
pub type Cell = Option<String>;

/// Turn a raw field into a [`Cell`], mapping null markers to `None`.
///
/// Surrounding whitespace is ignored when checking for a null marker but the
/// original text is kept for non-null values.
pub fn normalize_cell(raw: &str) -> Cell {
    if NULL_MARKERS.contains(&raw.trim()) {
        None
    } else {
        Some(raw.to_string())
    }
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// An already-decoded, in-memory row set with named columns.
///
/// Rows always hold exactly one cell per header, including tables read back
/// from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTable")]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

#[derive(Deserialize)]
struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl From<RawTable> for Table {
    fn from(raw: RawTable) -> Self {
        let mut table = Table::new(raw.headers);
        for row in raw.rows {
            table.push_row(row);
        }
        table
    }
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding with nulls or truncating to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    /// Convenience builder used by tests and small fixtures: every `&str`
    /// goes through [`normalize_cell`].
    pub fn from_str_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Self::new(headers.iter().copied());
        for row in rows {
            table.push_row(row.iter().map(|raw| normalize_cell(raw)).collect());
        }
        table
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` among the headers.
    ///
    /// Returns [`JourneyError::MissingField`] when the column is absent.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| JourneyError::missing(name))
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].as_deref()).collect())
    }

    /// Keep only rows whose `column` equals `value` exactly.
    pub fn filter_eq(&self, column: &str, value: &str) -> Result<Table> {
        let idx = self.column_index(column)?;
        Ok(Table {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| row[idx].as_deref() == Some(value))
                .cloned()
                .collect(),
        })
    }

    /// Return a copy holding only `columns`, in the order given.
    pub fn select(&self, columns: &[&str]) -> Result<Table> {
        let idx = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Table {
            headers: columns.iter().map(|c| c.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| idx.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Return a copy with `values` appended as a new column named `name`.
    ///
    /// `values` is padded with nulls when shorter than the table.
    pub fn with_column(&self, name: impl Into<String>, values: Vec<Cell>) -> Table {
        let mut headers = self.headers.clone();
        headers.push(name.into());
        let mut values = values.into_iter();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.push(values.next().flatten());
                row
            })
            .collect();
        Table { headers, rows }
    }

    /// Distinct non-null values of `column` in first-seen order.
    pub fn distinct(&self, column: &str) -> Result<Vec<String>> {
        let mut seen = Vec::new();
        for value in self.column(column)?.into_iter().flatten() {
            if !seen.iter().any(|s: &String| s == value) {
                seen.push(value.to_string());
            }
        }
        Ok(seen)
    }
}

// ── Pipeline outputs ──────────────────────────────────────────────────────────

/// One housing stay for a client, inclusive of both endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub client: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// `(end - start) + 1`, always at least 1.
    pub duration_days: i64,
}

impl Interval {
    /// Build an interval, or `None` when `end` precedes `start`.
    pub fn new(client: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if end < start {
            return None;
        }
        Some(Self {
            client: client.into(),
            start,
            end,
            duration_days: (end - start).num_days() + 1,
        })
    }
}

/// Total days housed for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTotal {
    pub client: String,
    pub total_days_housed: i64,
}

/// One group of a categorical aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRow {
    /// Values of the grouping columns, in the order the keys were requested.
    pub group_keys: Vec<String>,
    pub measure_sum: f64,
}

/// One day of the check-in calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarBucket {
    pub date: NaiveDate,
    pub value: i64,
}

/// A token and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedToken {
    pub token: String,
    pub count: usize,
}

// ── Chart descriptors ─────────────────────────────────────────────────────────

/// Which kind of chart the boundary should draw for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Timeline,
    Bar,
    Radar,
    Pie,
    StackedBar,
    Calendar,
    Treemap,
}

/// The x/y/category schema handed to the rendering boundary with a series.
///
/// Carries no colour or layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x: String,
    /// Second x column for range charts (timeline bars).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_end: Option<String>,
    pub y: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: impl Into<String>, x: &str, y: &str) -> Self {
        Self {
            kind,
            title: title.into(),
            x: x.to_string(),
            x_end: None,
            y: y.to_string(),
            category: None,
        }
    }

    pub fn with_x_end(mut self, x_end: &str) -> Self {
        self.x_end = Some(x_end.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
