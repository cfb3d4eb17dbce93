//! Delimited-text dataset reader.

use crate::domain::dataset::{CLOSE, TimeSeriesDataset};
use crate::domain::error::LoadError;
use std::path::Path;
use tracing::debug;

// Same token set pandas treats as missing by default.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub struct CsvAdapter;

impl CsvAdapter {
    pub fn read(&self, path: &Path) -> Result<TimeSeriesDataset, LoadError> {
        let mut rdr = csv::Reader::from_path(path).map_err(|e| parse_failure(path, e))?;

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| parse_failure(path, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut cells: Vec<Vec<Option<f64>>> = vec![Vec::new(); headers.len()];
        let mut numeric = vec![true; headers.len()];

        for result in rdr.records() {
            let record = result.map_err(|e| parse_failure(path, e))?;
            for (i, field) in record.iter().enumerate() {
                if !numeric[i] {
                    continue;
                }
                match parse_cell(field) {
                    Some(value) => cells[i].push(value),
                    None => numeric[i] = false,
                }
            }
        }

        let columns: Vec<(String, Vec<Option<f64>>)> = headers
            .into_iter()
            .zip(cells)
            .zip(numeric)
            .filter_map(|((name, values), is_numeric)| {
                if is_numeric {
                    Some((name, values))
                } else {
                    debug!(column = %name, "dropping non-numeric column");
                    None
                }
            })
            .collect();

        let dataset = TimeSeriesDataset::from_columns(columns).map_err(|e| match e {
            LoadError::ParseFailure { reason, .. } => LoadError::ParseFailure {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;

        check_loaded(path, dataset)
    }
}

/// `Some(None)` for a missing marker or NaN, `Some(Some(v))` for a number,
/// `None` when the cell is not numeric.
fn parse_cell(field: &str) -> Option<Option<f64>> {
    let field = field.trim();
    if MISSING_MARKERS.contains(&field) {
        return Some(None);
    }
    field.parse::<f64>().ok().map(|v| Some(v).filter(|v| !v.is_nan()))
}

/// Enforces the loader contract: at least one row and a numeric `Close` column.
pub(crate) fn check_loaded(
    path: &Path,
    dataset: TimeSeriesDataset,
) -> Result<TimeSeriesDataset, LoadError> {
    if !dataset.has_column(CLOSE) {
        return Err(LoadError::ParseFailure {
            path: path.display().to_string(),
            reason: format!("no numeric {} column", CLOSE),
        });
    }
    if dataset.is_empty() {
        return Err(LoadError::ParseFailure {
            path: path.display().to_string(),
            reason: "no data rows".into(),
        });
    }
    Ok(dataset)
}

fn parse_failure(path: &Path, err: impl std::fmt::Display) -> LoadError {
    LoadError::ParseFailure {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
