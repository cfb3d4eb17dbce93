//! File-backed [`DataPort`] dispatching on the configured file type.

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::parquet_adapter::ParquetAdapter;
use crate::domain::dataset::{FileFormat, TimeSeriesDataset};
use crate::domain::error::LoadError;
use crate::ports::data_port::DataPort;
use std::path::Path;
use tracing::info;

pub struct FileDataAdapter;

impl DataPort for FileDataAdapter {
    fn load(&self, source: &Path, format: &str) -> Result<TimeSeriesDataset, LoadError> {
        let format: FileFormat = format.parse()?;

        if !source.is_file() {
            return Err(LoadError::NotFound {
                path: source.display().to_string(),
            });
        }

        let dataset = match format {
            FileFormat::Csv => CsvAdapter.read(source)?,
            FileFormat::Parquet => ParquetAdapter.read(source)?,
        };

        info!(
            path = %source.display(),
            %format,
            rows = dataset.row_count(),
            columns = dataset.column_names().count(),
            "loaded dataset"
        );
        Ok(dataset)
    }
}
