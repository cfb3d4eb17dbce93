//! Columnar-binary (Parquet) dataset reader.
//!
//! Numeric Arrow columns are cast to `Float64`; nulls and NaN become missing
//! cells.
//! Other column types (dates, strings, booleans) are dropped.

use crate::adapters::csv_adapter::check_loaded;
use crate::domain::dataset::TimeSeriesDataset;
use crate::domain::error::LoadError;
use arrow::array::AsArray;
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

pub struct ParquetAdapter;

impl ParquetAdapter {
    pub fn read(&self, path: &Path) -> Result<TimeSeriesDataset, LoadError> {
        let file = File::open(path).map_err(|e| parse_failure(path, e))?;
        let builder =
            ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| parse_failure(path, e))?;

        let schema = builder.schema().clone();
        let numeric: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter_map(|(i, field)| {
                if field.data_type().is_numeric() {
                    Some((i, field.name().clone()))
                } else {
                    debug!(column = %field.name(), data_type = %field.data_type(), "dropping non-numeric column");
                    None
                }
            })
            .collect();

        let reader = builder.build().map_err(|e| parse_failure(path, e))?;
        let mut cells: Vec<Vec<Option<f64>>> = vec![Vec::new(); numeric.len()];

        for batch in reader {
            let batch = batch.map_err(|e| parse_failure(path, e))?;
            for (slot, (index, _)) in numeric.iter().enumerate() {
                let column = cast(batch.column(*index), &DataType::Float64)
                    .map_err(|e| parse_failure(path, e))?;
                cells[slot].extend(
                    column
                        .as_primitive::<Float64Type>()
                        .iter()
                        .map(|v| v.filter(|x| !x.is_nan())),
                );
            }
        }

        let columns = numeric
            .into_iter()
            .map(|(_, name)| name)
            .zip(cells);
        let dataset = TimeSeriesDataset::from_columns(columns)?;

        check_loaded(path, dataset)
    }
}

fn parse_failure(path: &Path, err: impl std::fmt::Display) -> LoadError {
    LoadError::ParseFailure {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
