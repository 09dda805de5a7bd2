//! Categorical group-by aggregation over decoded tables.
//!
//! Two stages, kept separate so each can be tested on its own:
//!
//! 1. [`CategoricalAggregator::melt`] reshapes a wide table (one column per
//!    category) into long form without touching any value.
//! 2. [`CategoricalAggregator::aggregate`] drops rows with nulls in the
//!    relevant columns, then sums a numeric measure per distinct key tuple.

use std::collections::HashMap;

use tracing::debug;

use journey_core::identifiers::ClientDirectory;
use journey_core::models::{AggregationRow, Cell, Table};
use journey_core::{JourneyError, Result};

// ── CategoricalAggregator ─────────────────────────────────────────────────────

/// Stateless helper that groups table rows by categorical keys.
pub struct CategoricalAggregator;

impl CategoricalAggregator {
    /// Sum `measure` per distinct tuple of `group_keys`.
    ///
    /// Rows with a null in any `drop_nulls_on` column, any group key, or the
    /// measure are removed first, across the whole table. Output groups are in
    /// first-seen order. An empty table (or one that becomes empty after
    /// exclusion) yields an empty result.
    pub fn aggregate(
        rows: &Table,
        group_keys: &[&str],
        measure: &str,
        drop_nulls_on: &[&str],
    ) -> Result<Vec<AggregationRow>> {
        if group_keys.is_empty() {
            return Err(JourneyError::Config(
                "aggregation needs at least one group key".to_string(),
            ));
        }

        let key_idx = group_keys
            .iter()
            .map(|k| rows.column_index(k))
            .collect::<Result<Vec<_>>>()?;
        let measure_idx = rows.column_index(measure)?;
        let mut required = drop_nulls_on
            .iter()
            .map(|c| rows.column_index(c))
            .collect::<Result<Vec<_>>>()?;
        required.extend(&key_idx);
        required.push(measure_idx);

        let kept: Vec<&Vec<Cell>> = rows
            .rows()
            .iter()
            .filter(|row| required.iter().all(|&i| row[i].is_some()))
            .collect();
        debug!(
            "Aggregating {} by {:?}: kept {} of {} rows",
            measure,
            group_keys,
            kept.len(),
            rows.len()
        );

        let mut out: Vec<AggregationRow> = Vec::new();
        let mut positions: HashMap<Vec<String>, usize> = HashMap::new();

        for row in kept {
            let value = parse_measure(measure, row[measure_idx].as_deref().unwrap_or_default())?;
            let key: Vec<String> = key_idx
                .iter()
                .map(|&i| row[i].clone().unwrap_or_default())
                .collect();

            match positions.get(&key) {
                Some(&pos) => out[pos].measure_sum += value,
                None => {
                    positions.insert(key.clone(), out.len());
                    out.push(AggregationRow {
                        group_keys: key,
                        measure_sum: value,
                    });
                }
            }
        }

        Ok(out)
    }

    /// Reshape a wide table into `[id_column, var_name, value_name]` rows.
    ///
    /// Every column other than `id_column` becomes its own output row for
    /// every input row, column by column. Cells are copied unchanged,
    /// nulls included.
    pub fn melt(table: &Table, id_column: &str, var_name: &str, value_name: &str) -> Result<Table> {
        let id_idx = table.column_index(id_column)?;
        let mut long = Table::new([id_column, var_name, value_name]);

        for (col_idx, header) in table.headers().iter().enumerate() {
            if col_idx == id_idx {
                continue;
            }
            for row in table.rows() {
                long.push_row(vec![
                    row[id_idx].clone(),
                    Some(header.clone()),
                    row[col_idx].clone(),
                ]);
            }
        }

        Ok(long)
    }

    /// Return a copy of `table` with a `name_column` holding the display name
    /// of each row's `id_column`. Unmapped or null ids give a null name.
    pub fn attach_names(
        table: &Table,
        id_column: &str,
        name_column: &str,
        directory: &ClientDirectory,
    ) -> Result<Table> {
        let names: Vec<Cell> = table
            .column(id_column)?
            .into_iter()
            .map(|id| id.and_then(|raw| directory.resolve_cell(raw)).map(str::to_string))
            .collect();
        Ok(table.with_column(name_column, names))
    }

    /// Columns (other than `skip`) whose non-null cells all parse as numbers,
    /// in header order. An all-null column counts as numeric.
    pub fn numeric_columns(table: &Table, skip: &[&str]) -> Vec<String> {
        table
            .headers()
            .iter()
            .enumerate()
            .filter(|(_, h)| !skip.contains(&h.as_str()))
            .filter(|(i, h)| {
                table
                    .rows()
                    .iter()
                    .filter_map(|row| row[*i].as_deref())
                    .all(|raw| parse_measure(h, raw).is_ok())
            })
            .map(|(_, h)| h.clone())
            .collect()
    }

    /// Largest `measure_sum`, or `None` for an empty result.
    pub fn max_measure(rows: &[AggregationRow]) -> Option<f64> {
        rows.iter().map(|r| r.measure_sum).reduce(f64::max)
    }
}

fn parse_measure(column: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| JourneyError::InvalidNumber {
            column: column.to_string(),
            value: raw.to_string(),
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
