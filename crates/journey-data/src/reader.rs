//! Flat-file loading for the journey pipeline.
//!
//! Decodes the exported CSV tables into [`Table`]s, joins free-text columns
//! into a single blob, and reads the per-client timeline documents. Every
//! loader either returns a fully materialised value or an error; there is no
//! partial result.

use std::path::{Path, PathBuf};

use journey_core::identifiers::{data_file_stem, CLIENT_ROSTER};
use journey_core::models::{normalize_cell, Table};
use journey_core::{JourneyError, Result};
use tracing::{debug, warn};

/// Housing ranges export.
pub const HOUSING_FILE: &str = "housed_date.csv";
/// Program visits export keyed by numeric client id.
pub const VISITS_FILE: &str = "bar_stack.csv";
/// Storage / service usage export, one column per service.
pub const STORAGE_FILE: &str = "storage.csv";

// ── CSV decoding ──────────────────────────────────────────────────────────────

/// Decode CSV text with a header row into a [`Table`].
///
/// Ragged rows are padded with nulls; null markers (`""`, `NaN`, …) become
/// `None`.
pub fn read_csv_str(text: &str) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = Table::new(headers);

    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(normalize_cell).collect());
    }

    Ok(table)
}

/// Read and decode a CSV file.
pub fn read_csv_file(path: &Path) -> Result<Table> {
    let text = read_to_string(path)?;
    let table = read_csv_str(&text)?;
    debug!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.headers().len(),
        path.display()
    );
    Ok(table)
}

/// Join every non-null value of `column` with single spaces.
pub fn join_text_column(table: &Table, column: &str) -> Result<String> {
    let values: Vec<&str> = table.column(column)?.into_iter().flatten().collect();
    Ok(values.join(" "))
}

/// Read a per-client timeline document, forwarded to the boundary as-is.
pub fn read_timeline(path: &Path) -> Result<serde_json::Value> {
    let text = read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| JourneyError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

// ── Data directory layout ─────────────────────────────────────────────────────

/// Resolves where each export lives inside a data directory.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn housing(&self) -> PathBuf {
        self.root.join(HOUSING_FILE)
    }

    pub fn visits(&self) -> PathBuf {
        self.root.join(VISITS_FILE)
    }

    pub fn storage(&self) -> PathBuf {
        self.root.join(STORAGE_FILE)
    }

    /// Check-in export: `<first-name>.csv`.
    pub fn check_ins(&self, client: &str) -> PathBuf {
        self.root.join(format!("{}.csv", data_file_stem(client)))
    }

    /// Case-note log: `<Display Name>.csv`.
    pub fn case_notes(&self, client: &str) -> PathBuf {
        self.root.join(format!("{}.csv", client))
    }

    /// Timeline document: `<Display Name>.json`.
    pub fn timeline(&self, client: &str) -> PathBuf {
        self.root.join(format!("{}.json", client))
    }

    /// All `.csv` files directly inside the data directory, sorted by path.
    pub fn csv_files(&self) -> Vec<PathBuf> {
        if !self.root.exists() {
            warn!("Data directory does not exist: {}", self.root.display());
            return Vec::new();
        }

        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&self.root)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry
                        .path()
                        .extension()
                        .map(|ext| ext == "csv")
                        .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect();

        files.sort();
        files
    }

    /// Roster clients whose check-in export is present, in roster order.
    pub fn available_clients(&self) -> Vec<&'static str> {
        let files = self.csv_files();
        CLIENT_ROSTER
            .iter()
            .copied()
            .filter(|client| files.contains(&self.check_ins(client)))
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
