//! Column-oriented time series dataset.
//!
//! Columns keep the order they were read in and every column holds one cell
//! per row, `None` marking a missing value. Row order is time order.

use crate::domain::error::LoadError;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const CLOSE: &str = "Close";

/// Input formats accepted by the loading stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FromStr for FileFormat {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "parquet" => Ok(FileFormat::Parquet),
            _ => Err(LoadError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Csv => write!(f, "csv"),
            FileFormat::Parquet => write!(f, "parquet"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeriesDataset {
    columns: IndexMap<String, Vec<Option<f64>>>,
    row_count: usize,
}

impl TimeSeriesDataset {
    /// Builds a dataset from named columns. All columns must have the same length.
    pub fn from_columns<I>(columns: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = (String, Vec<Option<f64>>)>,
    {
        let mut map = IndexMap::new();
        let mut row_count: Option<usize> = None;

        for (name, values) in columns {
            match row_count {
                Some(n) if n != values.len() => {
                    return Err(LoadError::ParseFailure {
                        path: "<memory>".into(),
                        reason: format!(
                            "column {} has {} rows, expected {}",
                            name,
                            values.len(),
                            n
                        ),
                    });
                }
                _ => row_count = Some(values.len()),
            }
            if map.insert(name.clone(), values).is_some() {
                return Err(LoadError::ParseFailure {
                    path: "<memory>".into(),
                    reason: format!("duplicate column {}", name),
                });
            }
        }

        Ok(Self {
            columns: map,
            row_count: row_count.unwrap_or(0),
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Row `index` as column name -> cell, in column order.
    pub fn row(&self, index: usize) -> Option<IndexMap<&str, Option<f64>>> {
        if index >= self.row_count {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|(name, values)| (name.as_str(), values[index]))
                .collect(),
        )
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Vec<Option<f64>>> {
        self.columns.get_mut(name)
    }

    /// Inserts or replaces a column. Replacing keeps the column's position.
    pub(crate) fn set_column(&mut self, name: &str, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.row_count);
        self.columns.insert(name.to_string(), values);
    }

    pub(crate) fn remove_column(&mut self, name: &str) -> Option<Vec<Option<f64>>> {
        self.columns.shift_remove(name)
    }

    /// Column-oriented copy of the dataset for handing to an external engine.
    pub fn to_column_record(&self) -> ColumnRecord {
        ColumnRecord(self.columns.clone())
    }
}

/// Column name -> values, serialized as a JSON object of arrays with `null`
/// for missing cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ColumnRecord(pub IndexMap<String, Vec<Option<f64>>>);

impl ColumnRecord {
    pub fn max_len(&self) -> usize {
        self.0.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Pads shorter columns with missing markers so every column has the
    /// same length, as fixed-length struct fields require.
    pub fn pad_to_max_len(&mut self) {
        let max_len = self.max_len();
        for values in self.0.values_mut() {
            values.resize(max_len, None);
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
